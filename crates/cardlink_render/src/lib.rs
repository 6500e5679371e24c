//! Shared text and JSON rendering of cardlink results, so the CLI and any
//! other frontend report identically.

use std::fmt::Write as _;

use cardlink_core::linker::LinkResult;
use cardlink_core::patch::PatchReport;
use cardlink_core::save::{SaveImage, TitleMetadata};
use serde_json::{Map as JsonMap, Value as JsonValue};

pub fn link_result_text(result: &LinkResult) -> String {
    let mut out = String::new();
    let verb = if result.dry_run { "would link" } else { "linked" };
    let _ = writeln!(
        out,
        "{verb} {} cards for '{}': {} pointer bytes + {} name bytes, {} bytes slack",
        result.cards, result.language, result.pointer_bytes, result.name_bytes, result.slack_bytes
    );
    if result.grew() {
        let _ = writeln!(
            out,
            "block count {} -> {}",
            result.blocks_before, result.blocks_after
        );
    } else {
        let _ = writeln!(out, "block count unchanged at {}", result.blocks_after);
    }
    out
}

pub fn link_result_json(result: &LinkResult) -> JsonValue {
    let mut map = JsonMap::new();
    map.insert("language".into(), result.language.clone().into());
    map.insert("dry_run".into(), result.dry_run.into());
    map.insert("cards".into(), result.cards.into());
    map.insert("pointer_bytes".into(), result.pointer_bytes.into());
    map.insert("name_bytes".into(), result.name_bytes.into());
    map.insert("table_bytes".into(), result.table_bytes().into());
    map.insert("slack_bytes".into(), result.slack_bytes.into());
    map.insert("blocks_before".into(), result.blocks_before.into());
    map.insert("blocks_after".into(), result.blocks_after.into());
    JsonValue::Object(map)
}

pub fn patch_report_text(report: &PatchReport, verbose: bool) -> String {
    let mut out = String::new();
    if verbose || report.dry_run {
        for write in &report.writes {
            let verb = if report.dry_run { "plan" } else { "wrote" };
            let _ = writeln!(
                out,
                "{verb} {}: {} bytes at {:#06x}",
                write.name, write.len, write.offset
            );
        }
    }
    let verb = if report.dry_run {
        "would apply"
    } else {
        "applied"
    };
    let _ = writeln!(
        out,
        "{verb} {} patches for '{}' ({} bytes), {} skipped without a payload",
        report.applied(),
        report.language,
        if report.dry_run {
            report.writes.iter().map(|w| w.len).sum()
        } else {
            report.bytes_written
        },
        report.skipped
    );
    out
}

pub fn patch_report_json(report: &PatchReport) -> JsonValue {
    let mut map = JsonMap::new();
    map.insert("language".into(), report.language.clone().into());
    map.insert("dry_run".into(), report.dry_run.into());
    map.insert("applied".into(), report.applied().into());
    map.insert("skipped".into(), report.skipped.into());
    map.insert("bytes_written".into(), report.bytes_written.into());
    let writes: Vec<JsonValue> = report
        .writes
        .iter()
        .map(|w| {
            let mut entry = JsonMap::new();
            entry.insert("name".into(), w.name.clone().into());
            entry.insert("offset".into(), w.offset.into());
            entry.insert("len".into(), w.len.into());
            JsonValue::Object(entry)
        })
        .collect();
    map.insert("writes".into(), writes.into());
    JsonValue::Object(map)
}

pub fn info_text(image: &SaveImage, title: &TitleMetadata) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "file: {} bytes ({} content), {} occupied blocks",
        image.len(),
        image.content_len(),
        image.occupied_blocks()
    );
    let _ = writeln!(
        out,
        "magic: {}",
        if title.magic_ok { "SC" } else { "missing" }
    );
    let _ = writeln!(out, "icon frames: {}", title.icon_frames);
    let _ = writeln!(out, "declared blocks: {}", title.block_count);
    let _ = writeln!(out, "save type: {}", title.save_type_str());
    let _ = writeln!(out, "mc icon frames: {}", title.mc_icon_count);
    let _ = writeln!(out, "exec icons: {}", title.exec_icon_count);
    let _ = writeln!(
        out,
        "entry point: {:#010x} ({})",
        title.entry_point,
        if title.thumb_entry() { "thumb" } else { "arm" }
    );
    out
}

pub fn info_json(image: &SaveImage, title: &TitleMetadata) -> JsonValue {
    let mut map = JsonMap::new();
    map.insert("file_len".into(), image.len().into());
    map.insert("content_len".into(), image.content_len().into());
    map.insert("occupied_blocks".into(), image.occupied_blocks().into());
    map.insert("magic_ok".into(), title.magic_ok.into());
    map.insert("icon_frames".into(), title.icon_frames.into());
    map.insert("declared_blocks".into(), title.block_count.into());
    map.insert("save_type".into(), title.save_type_str().into());
    map.insert("mc_icon_frames".into(), title.mc_icon_count.into());
    map.insert("exec_icons".into(), title.exec_icon_count.into());
    map.insert("entry_point".into(), title.entry_point.into());
    map.insert("thumb_entry".into(), title.thumb_entry().into());
    JsonValue::Object(map)
}
