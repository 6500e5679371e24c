//! Fixed geometry of the save image and the catalog of named regions.
//!
//! All offsets here are *logical*: relative to the start of the save data,
//! before any container header. The offsets come from the disassembly notes
//! for the base game and are versioned as one table so call sites never
//! hard-code them.

/// 8 KiB storage unit of the card's addressable save area.
pub const BLOCK_SIZE: usize = 8192;
/// 128-byte sub-unit of a block; smallest write granularity for metadata.
pub const FRAME_SIZE: usize = 128;
/// Frames per block.
pub const FRAMES_PER_BLOCK: usize = BLOCK_SIZE / FRAME_SIZE;
/// Highest block count representable in the title frame.
pub const MAX_BLOCKS: u8 = 15;

/// Memory-mapped base address of the save data on the target device.
pub const MEM_BASE: u32 = 0x0200_0000;

/// Size of the single-save container wrapper header (`--mcs` mode).
pub const MCS_HEADER_SIZE: u64 = 0x80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A named fixed region or field of the save image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutField {
    pub name: &'static str,
    pub offset: usize,
    pub size: usize,
}

impl LayoutField {
    pub const fn range(&self) -> ByteRange {
        ByteRange {
            start: self.offset,
            end: self.offset + self.size,
        }
    }
}

/// Catalog version; bump when any offset below changes.
pub const LAYOUT_VERSION: u32 = 1;

// Title frame (block 0, frame 0).
pub const TITLE_MAGIC: LayoutField = field("title.magic", 0x00, 2);
pub const TITLE_ICON_FLAG: LayoutField = field("title.icon_flag", 0x02, 1);
pub const TITLE_BLOCK_COUNT: LayoutField = field("title.block_count", 0x03, 1);
pub const TITLE_NAME: LayoutField = field("title.name", 0x04, 64);
pub const TITLE_MC_ICON_COUNT: LayoutField = field("title.mc_icon_count", 0x50, 2);
pub const TITLE_SAVE_TYPE_TAG: LayoutField = field("title.save_type_tag", 0x52, 4);
pub const TITLE_EXEC_ICON_COUNT: LayoutField = field("title.exec_icon_count", 0x56, 2);
pub const TITLE_ENTRY_POINT: LayoutField = field("title.entry_point", 0x58, 4);

// Card name linking.
pub const NAME_LOOKUP_POINTER: LayoutField = field("names.lookup_pointer", 0x2A7C, 4);
pub const NAME_REGION: LayoutField = field("names.region", 0x8000, 0);

pub const FIELDS: &[LayoutField] = &[
    TITLE_MAGIC,
    TITLE_ICON_FLAG,
    TITLE_BLOCK_COUNT,
    TITLE_NAME,
    TITLE_MC_ICON_COUNT,
    TITLE_SAVE_TYPE_TAG,
    TITLE_EXEC_ICON_COUNT,
    TITLE_ENTRY_POINT,
    NAME_LOOKUP_POINTER,
    NAME_REGION,
];

const fn field(name: &'static str, offset: usize, size: usize) -> LayoutField {
    LayoutField { name, offset, size }
}

pub fn field_by_name(name: &str) -> Option<LayoutField> {
    FIELDS.iter().copied().find(|f| f.name == name)
}

/// Blocks needed to hold `content_len` bytes of save data.
pub fn blocks_for_len(content_len: usize) -> usize {
    content_len.div_ceil(BLOCK_SIZE)
}
