use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{CoreError, CoreResult};

use super::{default_true, hex_or_int_usize, HexBytes};

/// A named byte replacement with one payload per supported language.
/// Languages without a payload are simply not covered by this entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatchEntry {
    pub name: String,
    #[serde(deserialize_with = "hex_or_int_usize")]
    pub offset: usize,
    pub payloads: BTreeMap<String, HexBytes>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl PatchEntry {
    pub fn payload_for(&self, language: &str) -> Option<&[u8]> {
        self.payloads.get(language).map(|p| p.as_slice())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatchesManifest {
    #[serde(default)]
    pub version: u32,
    pub patches: Vec<PatchEntry>,
}

impl PatchesManifest {
    pub fn from_str(text: &str) -> CoreResult<Self> {
        let manifest: Self = serde_json::from_str(text)
            .map_err(|e| CoreError::manifest(format!("patches manifest: {e}")))?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn load(path: &Path) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| CoreError::manifest(format!("{}: {e}", path.display())))?;
        Self::from_str(&text)
    }

    /// Static checks: named entries, non-empty payloads, and at most one
    /// active entry per (language, offset). Overlapping *ranges* stay
    /// legal; application order makes the last write win.
    fn validate(&self) -> CoreResult<()> {
        let mut seen: BTreeMap<(&str, usize), &str> = BTreeMap::new();
        for entry in &self.patches {
            if entry.name.is_empty() {
                return Err(CoreError::manifest("patch entry with empty name"));
            }
            for (language, payload) in &entry.payloads {
                if payload.is_empty() {
                    return Err(CoreError::manifest(format!(
                        "patch '{}': empty payload for language '{language}'",
                        entry.name
                    )));
                }
                if !entry.active {
                    continue;
                }
                if let Some(previous) = seen.insert((language.as_str(), entry.offset), &entry.name)
                {
                    return Err(CoreError::manifest(format!(
                        "patches '{previous}' and '{}' both target offset {:#x} for \
                         language '{language}'",
                        entry.name, entry.offset
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn languages(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self
            .patches
            .iter()
            .flat_map(|p| p.payloads.keys().map(String::as_str))
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "version": 1,
        "patches": [
            {"name": "save-title", "offset": "0x04",
             "payloads": {"english": "50 6F 63", "german": "47 65 72"},
             "comment": "menu title text"},
            {"name": "menu-label", "offset": 600,
             "payloads": {"english": "4D 45 4E 55"}}
        ]
    }"#;

    #[test]
    fn parses_and_lists_languages() {
        let manifest = PatchesManifest::from_str(SAMPLE).unwrap();
        assert_eq!(manifest.patches.len(), 2);
        assert_eq!(manifest.languages(), vec!["english", "german"]);
        assert_eq!(
            manifest.patches[0].payload_for("english"),
            Some(&[0x50, 0x6F, 0x63][..])
        );
        assert!(manifest.patches[1].payload_for("german").is_none());
    }

    #[test]
    fn rejects_duplicate_active_offsets_per_language() {
        let bad = r#"{"patches": [
            {"name": "a", "offset": 16, "payloads": {"english": "00"}},
            {"name": "b", "offset": "0x10", "payloads": {"english": "01"}}
        ]}"#;
        let err = PatchesManifest::from_str(bad).unwrap_err();
        assert_eq!(err.kind, crate::error::CoreErrorKind::Manifest);
        assert!(err.message.contains("0x10"));
    }

    #[test]
    fn duplicate_offset_for_different_languages_is_fine() {
        let ok = r#"{"patches": [
            {"name": "a", "offset": 16, "payloads": {"english": "00"}},
            {"name": "b", "offset": 16, "payloads": {"german": "01"}}
        ]}"#;
        assert!(PatchesManifest::from_str(ok).is_ok());
    }

    #[test]
    fn inactive_entries_escape_the_duplicate_check() {
        let ok = r#"{"patches": [
            {"name": "a", "offset": 16, "payloads": {"english": "00"}},
            {"name": "b", "offset": 16, "payloads": {"english": "01"}, "active": false}
        ]}"#;
        assert!(PatchesManifest::from_str(ok).is_ok());
    }

    #[test]
    fn rejects_empty_payload() {
        let bad = r#"{"patches": [
            {"name": "a", "offset": 16, "payloads": {"english": ""}}
        ]}"#;
        assert!(PatchesManifest::from_str(bad).is_err());
    }
}
