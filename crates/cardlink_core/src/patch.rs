//! Patch application engine: manifest-declared byte replacements with
//! dry-run planning and post-write verification.

use crate::error::{CoreError, CoreResult};
use crate::manifest::PatchesManifest;
use crate::save::SaveImage;

#[derive(Debug, Clone, Default)]
pub struct PatchOptions {
    pub dry_run: bool,
    /// Restrict to the entry with this name.
    pub only: Option<String>,
    pub include_inactive: bool,
}

/// One write the engine performed or (in a dry run) would perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedWrite {
    pub name: String,
    pub offset: usize,
    pub len: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchReport {
    pub language: String,
    pub dry_run: bool,
    /// Entries skipped because they carry no payload for the language.
    /// Partial language coverage is expected, not an error.
    pub skipped: usize,
    pub bytes_written: usize,
    pub writes: Vec<PlannedWrite>,
}

impl PatchReport {
    pub fn applied(&self) -> usize {
        self.writes.len()
    }
}

/// Apply (or plan) every active entry's payload for `language`, in
/// manifest order. Overlapping ranges are legal; the later entry's bytes
/// prevail by contract. All offsets are bounds-checked before the first
/// byte is written, so a failing entry leaves the image untouched.
pub fn apply(
    image: &mut SaveImage,
    manifest: &PatchesManifest,
    language: &str,
    options: &PatchOptions,
) -> CoreResult<PatchReport> {
    let mut skipped = 0usize;
    let mut plan: Vec<(PlannedWrite, &[u8])> = Vec::new();

    for entry in &manifest.patches {
        if let Some(only) = options.only.as_deref()
            && entry.name != only
        {
            continue;
        }
        if !entry.active && !options.include_inactive {
            continue;
        }
        let Some(payload) = entry.payload_for(language) else {
            skipped += 1;
            continue;
        };

        // Resolve now so the whole stage aborts before any write lands.
        image.resolve_range(entry.offset, payload.len()).map_err(|e| {
            CoreError::new(e.kind, format!("patch '{}': {}", entry.name, e.message))
        })?;

        plan.push((
            PlannedWrite {
                name: entry.name.clone(),
                offset: entry.offset,
                len: payload.len(),
            },
            payload,
        ));
    }

    let mut bytes_written = 0usize;
    if !options.dry_run {
        for (write, payload) in &plan {
            image.write(write.offset, payload)?;
            let readback = image.read(write.offset, payload.len())?;
            if readback != *payload {
                return Err(CoreError::verification(format!(
                    "patch '{}': readback at {:#x} does not match the intended payload",
                    write.name, write.offset
                )));
            }
            bytes_written += payload.len();
        }
    }

    Ok(PatchReport {
        language: language.to_string(),
        dry_run: options.dry_run,
        skipped,
        bytes_written,
        writes: plan.into_iter().map(|(write, _)| write).collect(),
    })
}
