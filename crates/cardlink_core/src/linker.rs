//! Text/pointer linker: encodes the selected language's card names,
//! lays them into the growable name table, rewrites the pointer table and
//! lookup word, and keeps the declared block count honest.
//!
//! Everything is staged in memory; the image is only touched once every
//! name has encoded and the capacity accounting has passed, so a failed
//! relink leaves the image byte-identical.

use crate::error::{CoreError, CoreResult};
use crate::layout::{self, BLOCK_SIZE, MAX_BLOCKS, MEM_BASE, NAME_LOOKUP_POINTER, NAME_REGION};
use crate::manifest::CardsManifest;
use crate::save::SaveImage;

/// Summary of one relink run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkResult {
    pub language: String,
    pub cards: usize,
    pub pointer_bytes: usize,
    pub name_bytes: usize,
    /// Free bytes left in the blocks now reserved for the tables.
    pub slack_bytes: usize,
    pub blocks_before: u8,
    pub blocks_after: u8,
    pub dry_run: bool,
}

impl LinkResult {
    pub fn table_bytes(&self) -> usize {
        self.pointer_bytes + self.name_bytes
    }

    pub fn grew(&self) -> bool {
        self.blocks_after > self.blocks_before
    }
}

/// Relink the name and pointer tables for `language`.
///
/// The pointer table comes first, immediately followed by the name table,
/// at the name region's fixed offset. Pointer word `i` is the language's
/// bank tag in the high half and card `i`'s cumulative name offset in the
/// low half; boundaries between names are defined by the pointers alone.
pub fn relink(
    image: &mut SaveImage,
    manifest: &CardsManifest,
    language: &str,
    dry_run: bool,
) -> CoreResult<LinkResult> {
    let section = manifest.language(language)?;
    let cards = section.sorted_cards(language)?;
    let table = section.encoding_table(language)?;

    // Encode every name up front; card index alignment means an empty name
    // still occupies a zero-length slot with a valid pointer.
    let mut name_table = Vec::new();
    let mut offsets = Vec::with_capacity(cards.len());
    for card in &cards {
        let offset = name_table.len();
        if offset > u16::MAX as usize {
            return Err(CoreError::capacity(format!(
                "card {}: name table offset {offset:#x} does not fit in 16 bits",
                card.number
            )));
        }
        let encoded = table.encode(&card.name).map_err(|e| {
            CoreError::new(e.kind, format!("card {}: {}", card.number, e.message))
        })?;
        offsets.push(offset as u16);
        name_table.extend_from_slice(&encoded);
    }

    let mut pointer_table = Vec::with_capacity(cards.len() * 4);
    for &offset in &offsets {
        let word = (section.pointer_tag as u32) << 16 | offset as u32;
        pointer_table.extend_from_slice(&word.to_le_bytes());
    }

    let region = NAME_REGION.offset;
    let total = pointer_table.len() + name_table.len();
    let required_blocks = layout::blocks_for_len(region + total);

    let blocks_before = image.declared_block_count()?;
    // A corrupt declared count is not a growth baseline; start over from
    // what the tables actually need.
    let baseline = if (1..=MAX_BLOCKS).contains(&blocks_before) {
        blocks_before as usize
    } else {
        0
    };
    let blocks_after = required_blocks.max(baseline);
    if blocks_after > MAX_BLOCKS as usize {
        return Err(CoreError::capacity(format!(
            "{} cards need {required_blocks} blocks ({total} table bytes at {region:#x}); \
             format maximum is {MAX_BLOCKS}",
            cards.len()
        )));
    }

    let slack_bytes = blocks_after * BLOCK_SIZE - region - total;

    if !dry_run {
        image.grow_to_blocks(blocks_after)?;

        // One contiguous write: pointer table, then names.
        let mut blob = pointer_table.clone();
        blob.extend_from_slice(&name_table);
        image.write(region, &blob)?;

        image.write_u32_le(NAME_LOOKUP_POINTER.offset, MEM_BASE + region as u32)?;
        image.set_declared_block_count(blocks_after as u8)?;
    }

    Ok(LinkResult {
        language: language.to_string(),
        cards: cards.len(),
        pointer_bytes: pointer_table.len(),
        name_bytes: name_table.len(),
        slack_bytes,
        blocks_before,
        blocks_after: blocks_after as u8,
        dry_run,
    })
}
