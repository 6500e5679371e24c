use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::Deserialize;

use crate::error::{CoreError, CoreResult};
use crate::text::CharacterEncodingTable;

use super::hex_or_int_u16;

/// One card of a language's list: display name plus in-game numeric index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRecord {
    pub number: u32,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct RawCard {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    number: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawEncodingPair {
    #[serde(rename = "char")]
    ch: String,
    #[serde(deserialize_with = "hex_or_int_u16")]
    code: u16,
}

/// Everything the linker needs for one language: the pointer bank tag, the
/// glyph encoding table, and the card list.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LanguageSection {
    /// High-order half of each pointer word. The pointer encoding differs
    /// per localization, so this is manifest data, not a constant.
    #[serde(deserialize_with = "hex_or_int_u16")]
    pub pointer_tag: u16,
    encoding: Vec<RawEncodingPair>,
    cards: Vec<RawCard>,
}

impl LanguageSection {
    pub fn encoding_table(&self, language: &str) -> CoreResult<CharacterEncodingTable> {
        let mut pairs = Vec::with_capacity(self.encoding.len());
        for entry in &self.encoding {
            let mut chars = entry.ch.chars();
            let (Some(ch), None) = (chars.next(), chars.next()) else {
                return Err(CoreError::manifest(format!(
                    "language '{language}': encoding entry {:?} is not a single character",
                    entry.ch
                )));
            };
            let code = u8::try_from(entry.code).map_err(|_| {
                CoreError::manifest(format!(
                    "language '{language}': glyph code {:#x} for {:?} does not fit in one byte",
                    entry.code, entry.ch
                ))
            })?;
            pairs.push((ch, code));
        }
        CharacterEncodingTable::from_pairs(language, pairs)
    }

    /// Validated records, sorted by number ascending; the sort fixes the
    /// pointer-table order.
    pub fn sorted_cards(&self, language: &str) -> CoreResult<Vec<CardRecord>> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::with_capacity(self.cards.len());
        for (index, raw) in self.cards.iter().enumerate() {
            let (Some(name), Some(number)) = (raw.name.clone(), raw.number) else {
                return Err(CoreError::manifest(format!(
                    "language '{language}': card element {index} is missing \
                     'name' or 'number'"
                )));
            };
            if !seen.insert(number) {
                return Err(CoreError::manifest(format!(
                    "language '{language}': duplicate card number {number}"
                )));
            }
            out.push(CardRecord { number, name });
        }
        out.sort_by_key(|c| c.number);
        Ok(out)
    }

    pub fn card_count(&self) -> usize {
        self.cards.len()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CardsManifest {
    #[serde(default)]
    pub version: u32,
    pub languages: BTreeMap<String, LanguageSection>,
}

impl CardsManifest {
    pub fn from_str(text: &str) -> CoreResult<Self> {
        serde_json::from_str(text)
            .map_err(|e| CoreError::manifest(format!("cards manifest: {e}")))
    }

    pub fn load(path: &Path) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| CoreError::manifest(format!("{}: {e}", path.display())))?;
        Self::from_str(&text)
    }

    pub fn language(&self, key: &str) -> CoreResult<&LanguageSection> {
        self.languages.get(key).ok_or_else(|| {
            let available: Vec<&str> = self.languages.keys().map(String::as_str).collect();
            CoreError::manifest(format!(
                "language '{key}' not found in cards manifest; available: {}",
                available.join(", ")
            ))
        })
    }
}
