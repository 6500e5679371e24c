//! The in-memory save image: a bounds-checked byte buffer plus the
//! offset-base mode that maps manifest (logical) offsets to file offsets.

use std::fs;
use std::path::Path;

use crate::error::{CoreError, CoreErrorKind, CoreResult};
use crate::layout::{
    self, BLOCK_SIZE, FRAME_SIZE, MAX_BLOCKS, MCS_HEADER_SIZE, TITLE_BLOCK_COUNT, TITLE_ENTRY_POINT,
    TITLE_EXEC_ICON_COUNT, TITLE_ICON_FLAG, TITLE_MAGIC, TITLE_MC_ICON_COUNT, TITLE_NAME,
    TITLE_SAVE_TYPE_TAG,
};

/// How manifest-declared logical offsets map to physical file offsets.
///
/// Manifests are authored header-mode-agnostic; the caller states what the
/// target file actually carries. Never auto-sniffed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BaseMode {
    /// Bare save data, no wrapper.
    #[default]
    Raw,
    /// Single-save container with its fixed wrapper header.
    Mcs,
    /// Caller-supplied header size.
    Custom(u64),
}

impl BaseMode {
    pub fn delta(&self) -> u64 {
        match self {
            BaseMode::Raw => 0,
            BaseMode::Mcs => MCS_HEADER_SIZE,
            BaseMode::Custom(delta) => *delta,
        }
    }

    pub fn resolve(&self, logical: usize) -> u64 {
        self.delta() + logical as u64
    }
}

#[derive(Debug, Clone)]
pub struct SaveImage {
    bytes: Vec<u8>,
    base: BaseMode,
}

impl SaveImage {
    pub fn from_bytes(bytes: Vec<u8>, base: BaseMode) -> CoreResult<Self> {
        if bytes.len() % FRAME_SIZE != 0 {
            return Err(CoreError::bounds(format!(
                "file length {} is not a multiple of the {FRAME_SIZE}-byte frame size",
                bytes.len()
            )));
        }
        if (bytes.len() as u64) < base.delta() {
            return Err(CoreError::bounds(format!(
                "file length {} is smaller than the declared header size {}",
                bytes.len(),
                base.delta()
            )));
        }
        Ok(Self { bytes, base })
    }

    pub fn load(path: &Path, base: BaseMode) -> CoreResult<Self> {
        let bytes = fs::read(path)
            .map_err(|e| CoreError::new(CoreErrorKind::Io, format!("{}: {e}", path.display())))?;
        Self::from_bytes(bytes, base)
    }

    pub fn store(&self, path: &Path) -> CoreResult<()> {
        fs::write(path, &self.bytes)
            .map_err(|e| CoreError::new(CoreErrorKind::Io, format!("{}: {e}", path.display())))
    }

    pub fn base(&self) -> BaseMode {
        self.base
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Save-data length excluding the wrapper header.
    pub fn content_len(&self) -> usize {
        self.bytes.len() - self.base.delta() as usize
    }

    /// Blocks the current content actually occupies.
    pub fn occupied_blocks(&self) -> usize {
        layout::blocks_for_len(self.content_len())
    }

    /// Map a logical range to a physical one, rejecting anything outside
    /// the current file. Never clamps.
    pub fn resolve_range(&self, logical: usize, len: usize) -> CoreResult<usize> {
        let start = self.base.resolve(logical);
        let end = start
            .checked_add(len as u64)
            .ok_or_else(|| CoreError::bounds(format!("offset {logical:#x} + {len} overflows")))?;
        if end > self.bytes.len() as u64 {
            return Err(CoreError::bounds(format!(
                "logical offset {logical:#x} + {len} bytes resolves to {start:#x}..{end:#x}, \
                 past end of file ({} bytes)",
                self.bytes.len()
            )));
        }
        Ok(start as usize)
    }

    pub fn read(&self, logical: usize, len: usize) -> CoreResult<&[u8]> {
        let start = self.resolve_range(logical, len)?;
        Ok(&self.bytes[start..start + len])
    }

    pub fn write(&mut self, logical: usize, data: &[u8]) -> CoreResult<()> {
        let start = self.resolve_range(logical, data.len())?;
        self.bytes[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    pub fn read_u8(&self, logical: usize) -> CoreResult<u8> {
        Ok(self.read(logical, 1)?[0])
    }

    pub fn write_u8(&mut self, logical: usize, value: u8) -> CoreResult<()> {
        self.write(logical, &[value])
    }

    pub fn read_u16_le(&self, logical: usize) -> CoreResult<u16> {
        let b = self.read(logical, 2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u32_le(&self, logical: usize) -> CoreResult<u32> {
        let b = self.read(logical, 4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn write_u32_le(&mut self, logical: usize, value: u32) -> CoreResult<()> {
        self.write(logical, &value.to_le_bytes())
    }

    /// Extend the image so the save data spans exactly `blocks` blocks.
    /// New bytes are `0xFF`, matching the device's erased-flash fill.
    /// Never shrinks.
    pub fn grow_to_blocks(&mut self, blocks: usize) -> CoreResult<()> {
        if blocks > MAX_BLOCKS as usize {
            return Err(CoreError::capacity(format!(
                "{blocks} blocks required, format maximum is {MAX_BLOCKS}"
            )));
        }
        let target = self.base.delta() as usize + blocks * BLOCK_SIZE;
        if target > self.bytes.len() {
            self.bytes.resize(target, 0xFF);
        }
        Ok(())
    }

    pub fn title(&self) -> CoreResult<TitleMetadata> {
        TitleMetadata::parse(self)
    }

    pub fn declared_block_count(&self) -> CoreResult<u8> {
        self.read_u8(TITLE_BLOCK_COUNT.offset)
    }

    pub fn set_declared_block_count(&mut self, blocks: u8) -> CoreResult<()> {
        if blocks == 0 || blocks > MAX_BLOCKS {
            return Err(CoreError::capacity(format!(
                "declared block count {blocks} outside 1..={MAX_BLOCKS}"
            )));
        }
        self.write_u8(TITLE_BLOCK_COUNT.offset, blocks)
    }
}

/// Fields resident in block 0, frame 0.
///
/// The declared block count is the one correctness-critical field: it must
/// track the image's true occupied-block count after linker growth or the
/// host device refuses the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleMetadata {
    pub magic_ok: bool,
    pub icon_frames: u8,
    pub block_count: u8,
    pub title: Vec<u8>,
    pub mc_icon_count: u16,
    pub save_type_tag: [u8; 4],
    pub exec_icon_count: u16,
    pub entry_point: u32,
}

impl TitleMetadata {
    pub fn parse(image: &SaveImage) -> CoreResult<Self> {
        let magic = image.read(TITLE_MAGIC.offset, TITLE_MAGIC.size)?;
        let icon_flag = image.read_u8(TITLE_ICON_FLAG.offset)?;
        let block_count = image.read_u8(TITLE_BLOCK_COUNT.offset)?;
        let title = image.read(TITLE_NAME.offset, TITLE_NAME.size)?.to_vec();
        let mc_icon_count = image.read_u16_le(TITLE_MC_ICON_COUNT.offset)?;
        let tag = image.read(TITLE_SAVE_TYPE_TAG.offset, TITLE_SAVE_TYPE_TAG.size)?;
        let exec_icon_count = image.read_u16_le(TITLE_EXEC_ICON_COUNT.offset)?;
        let entry_point = image.read_u32_le(TITLE_ENTRY_POINT.offset)?;

        Ok(Self {
            magic_ok: magic == b"SC",
            // Icon flag 0x11..0x13 carries the frame count in its low nibble.
            icon_frames: icon_flag & 0x0F,
            block_count,
            title,
            mc_icon_count,
            save_type_tag: [tag[0], tag[1], tag[2], tag[3]],
            exec_icon_count,
            entry_point,
        })
    }

    /// The entry point's low bit selects the CPU mode on the device.
    pub fn thumb_entry(&self) -> bool {
        self.entry_point & 1 == 1
    }

    pub fn save_type_str(&self) -> String {
        self.save_type_tag
            .iter()
            .map(|&b| {
                if b.is_ascii_graphic() {
                    b as char
                } else {
                    '.'
                }
            })
            .collect()
    }
}
