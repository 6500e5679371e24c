//! Per-language character encoding into the ROM font's glyph codes.
//!
//! Each language carries its own table because localized builds reassign
//! glyph slots (kana slots reused for Latin accents, for example); the same
//! code means different characters per language, so there is deliberately
//! no shared global mapping.

use std::collections::BTreeMap;

use crate::error::{CoreError, CoreResult};

/// Typographic characters folded to their plain equivalents before glyph
/// lookup, so manifests authored in word processors still encode.
const FOLDS: &[(char, char)] = &[
    ('\u{2019}', '\''),
    ('\u{2018}', '\''),
    ('\u{201C}', '"'),
    ('\u{201D}', '"'),
    ('\u{2013}', '-'),
    ('\u{2014}', '-'),
    ('\u{FF03}', '#'),
    ('\u{2116}', '#'),
    ('\u{3000}', ' '),
];

pub fn normalize_char(ch: char) -> char {
    FOLDS
        .iter()
        .find(|(from, _)| *from == ch)
        .map(|(_, to)| *to)
        .unwrap_or(ch)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterEncodingTable {
    language: String,
    map: BTreeMap<char, u8>,
}

impl CharacterEncodingTable {
    pub fn from_pairs(
        language: &str,
        pairs: impl IntoIterator<Item = (char, u8)>,
    ) -> CoreResult<Self> {
        let mut map = BTreeMap::new();
        for (ch, code) in pairs {
            if let Some(previous) = map.insert(ch, code)
                && previous != code
            {
                return Err(CoreError::manifest(format!(
                    "language '{language}': character {ch:?} mapped to both \
                     {previous:#04x} and {code:#04x}"
                )));
            }
        }
        Ok(Self {
            language: language.to_string(),
            map,
        })
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn glyph(&self, ch: char) -> Option<u8> {
        self.map.get(&normalize_char(ch)).copied()
    }

    /// Encode a whole string; an unmapped character is a hard failure, not
    /// a silent drop.
    pub fn encode(&self, text: &str) -> CoreResult<Vec<u8>> {
        let mut out = Vec::with_capacity(text.len());
        for ch in text.chars() {
            let code = self.glyph(ch).ok_or_else(|| {
                CoreError::encoding(format!(
                    "character {ch:?} has no glyph in the '{}' encoding table",
                    self.language
                ))
            })?;
            out.push(code);
        }
        Ok(out)
    }
}
