//! Fixed-region resource packer: moves packed graphics in and out of the
//! pre-defined, fixed-size slots of the save image.
//!
//! Unlike the name table these regions never grow; a payload that is not
//! exactly the slot size is rejected before anything is written.

use crate::error::{CoreError, CoreResult};
use crate::manifest::GraphicsEntry;
use crate::save::SaveImage;

/// Write one frame's packed bytes into its slot. Returns the bytes written.
pub fn embed_frame(
    image: &mut SaveImage,
    entry: &GraphicsEntry,
    frame: usize,
    packed: &[u8],
) -> CoreResult<usize> {
    let slot = entry.slot_size();
    if packed.len() != slot {
        return Err(CoreError::capacity(format!(
            "resource '{}' frame {frame}: packed length {} does not equal slot size {slot}",
            entry.name,
            packed.len()
        )));
    }
    let offset = entry.frame_offset(frame);
    image.write(offset, packed).map_err(|e| {
        CoreError::new(
            e.kind,
            format!("resource '{}' frame {frame}: {}", entry.name, e.message),
        )
    })?;
    Ok(slot)
}

pub fn embed(image: &mut SaveImage, entry: &GraphicsEntry, packed: &[u8]) -> CoreResult<usize> {
    embed_frame(image, entry, 0, packed)
}

/// Read one frame's packed bytes back out. Read-only.
pub fn read_frame(image: &SaveImage, entry: &GraphicsEntry, frame: usize) -> CoreResult<Vec<u8>> {
    let offset = entry.frame_offset(frame);
    let bytes = image.read(offset, entry.slot_size()).map_err(|e| {
        CoreError::new(
            e.kind,
            format!("resource '{}' frame {frame}: {}", entry.name, e.message),
        )
    })?;
    Ok(bytes.to_vec())
}

pub fn read(image: &SaveImage, entry: &GraphicsEntry) -> CoreResult<Vec<u8>> {
    read_frame(image, entry, 0)
}
