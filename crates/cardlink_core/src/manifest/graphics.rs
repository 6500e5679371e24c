use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{CoreError, CoreResult};
use crate::gfx::{self, TileMode};

use super::{default_true, hex_or_int_usize, opt_hex_or_int_usize};

/// One named visual resource: a fixed-size, fixed-position 1bpp slot, or a
/// sequence of equally sized frames spaced `step` bytes apart.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphicsEntry {
    pub name: String,
    #[serde(deserialize_with = "hex_or_int_usize")]
    pub offset: usize,
    pub width: usize,
    pub height: usize,
    #[serde(default)]
    pub mode: TileMode,
    /// Authoring-side image path, used only for extract/pack round trips.
    pub image: PathBuf,
    #[serde(default = "default_true")]
    pub active: bool,
    /// Frame count; anything above 1 makes this a sequence.
    #[serde(default)]
    pub count: Option<usize>,
    /// Byte distance between consecutive frames; defaults to the slot size.
    #[serde(default, deserialize_with = "opt_hex_or_int_usize")]
    pub step: Option<usize>,
}

impl GraphicsEntry {
    /// Exact packed byte length of one frame.
    pub fn slot_size(&self) -> usize {
        gfx::slot_size(self.width, self.height)
    }

    pub fn frame_count(&self) -> usize {
        self.count.unwrap_or(1)
    }

    pub fn step(&self) -> usize {
        self.step.unwrap_or_else(|| self.slot_size())
    }

    pub fn frame_offset(&self, frame: usize) -> usize {
        self.offset + frame * self.step()
    }

    fn validate(&self) -> CoreResult<()> {
        if self.name.is_empty() {
            return Err(CoreError::manifest("graphics entry with empty name"));
        }
        if self.width == 0
            || self.height == 0
            || self.width % 8 != 0
            || self.height % 8 != 0
        {
            return Err(CoreError::manifest(format!(
                "graphics entry '{}': dimensions {}x{} are not positive multiples of 8",
                self.name, self.width, self.height
            )));
        }
        if self.frame_count() == 0 {
            return Err(CoreError::manifest(format!(
                "graphics entry '{}': sequence with zero frames",
                self.name
            )));
        }
        if self.frame_count() > 1 && self.step() < self.slot_size() {
            return Err(CoreError::manifest(format!(
                "graphics entry '{}': step {} smaller than slot size {}",
                self.name,
                self.step(),
                self.slot_size()
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphicsManifest {
    #[serde(default)]
    pub version: u32,
    pub assets: Vec<GraphicsEntry>,
}

impl GraphicsManifest {
    pub fn from_str(text: &str) -> CoreResult<Self> {
        let manifest: Self = serde_json::from_str(text)
            .map_err(|e| CoreError::manifest(format!("graphics manifest: {e}")))?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn load(path: &Path) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| CoreError::manifest(format!("{}: {e}", path.display())))?;
        Self::from_str(&text)
    }

    fn validate(&self) -> CoreResult<()> {
        for entry in &self.assets {
            entry.validate()?;
        }
        Ok(())
    }

    /// Entries surviving the `--only` / `--include-inactive` filters, in
    /// manifest order.
    pub fn select<'a>(
        &'a self,
        only: Option<&str>,
        include_inactive: bool,
    ) -> Vec<&'a GraphicsEntry> {
        self.assets
            .iter()
            .filter(|a| only.is_none_or(|name| a.name == name))
            .filter(|a| a.active || include_inactive)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "assets": [
            {"name": "title", "offset": "0x63C8", "width": 32, "height": 16,
             "mode": "grid", "image": "gfx/title.pgm"},
            {"name": "font", "offset": "0x7000", "width": 8, "height": 8,
             "mode": "linear", "image": "gfx/font.pgm", "count": 4, "active": false}
        ]
    }"#;

    #[test]
    fn parses_entries_and_defaults() {
        let manifest = GraphicsManifest::from_str(SAMPLE).unwrap();
        let title = &manifest.assets[0];
        assert_eq!(title.offset, 0x63C8);
        assert_eq!(title.slot_size(), 64);
        assert_eq!(title.frame_count(), 1);
        assert!(title.active);

        let font = &manifest.assets[1];
        assert_eq!(font.mode, TileMode::Linear);
        assert_eq!(font.step(), 8);
        assert_eq!(font.frame_offset(3), 0x7000 + 24);
    }

    #[test]
    fn select_honours_only_and_active_filters() {
        let manifest = GraphicsManifest::from_str(SAMPLE).unwrap();
        assert_eq!(manifest.select(None, false).len(), 1);
        assert_eq!(manifest.select(None, true).len(), 2);
        assert_eq!(manifest.select(Some("font"), true).len(), 1);
        assert!(manifest.select(Some("missing"), true).is_empty());
    }

    #[test]
    fn rejects_sub_tile_dimensions() {
        let bad = r#"{"assets": [{"name": "x", "offset": 0, "width": 12,
                       "height": 8, "image": "x.pgm"}]}"#;
        let err = GraphicsManifest::from_str(bad).unwrap_err();
        assert_eq!(err.kind, crate::error::CoreErrorKind::Manifest);
    }
}
