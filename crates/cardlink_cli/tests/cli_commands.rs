use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;

const BLOCK_SIZE: usize = 0x2000;

fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_cardlink"))
        .args(args)
        .output()
        .expect("failed to run cardlink CLI")
}

fn temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before unix epoch")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("{prefix}_{}_{}", std::process::id(), nanos));
    fs::create_dir_all(&dir).expect("should create temp dir");
    dir
}

/// A minimal raw save: `SC` magic, icon flag, declared block count.
fn write_save(path: &PathBuf, blocks: usize, header: usize) {
    let mut bytes = vec![0u8; header + blocks * BLOCK_SIZE];
    bytes[header] = b'S';
    bytes[header + 1] = b'C';
    bytes[header + 2] = 0x11;
    bytes[header + 3] = blocks as u8;
    fs::write(path, bytes).expect("should write save fixture");
}

fn write_cards_manifest(path: &PathBuf) {
    fs::write(
        path,
        r#"{
            "version": 1,
            "languages": {
                "english": {
                    "pointer_tag": "0x0200",
                    "encoding": [
                        {"char": "A", "code": "0x41"},
                        {"char": "B", "code": "0x42"},
                        {"char": "C", "code": "0x43"},
                        {"char": " ", "code": "0x20"}
                    ],
                    "cards": [
                        {"name": "AB", "number": 1},
                        {"name": "CA", "number": 2}
                    ]
                }
            }
        }"#,
    )
    .expect("should write cards manifest");
}

fn write_patches_manifest(path: &PathBuf) {
    fs::write(
        path,
        r#"{
            "version": 1,
            "patches": [
                {"name": "banner", "offset": "0x100",
                 "payloads": {"english": "DE AD", "german": "BE EF"}},
                {"name": "german-only", "offset": "0x200",
                 "payloads": {"german": "01"}}
            ]
        }"#,
    )
    .expect("should write patches manifest");
}

#[test]
fn info_reports_title_metadata() {
    let dir = temp_dir("cardlink_info");
    let save = dir.join("save.bin");
    write_save(&save, 3, 0);

    let output = run_cli(&["info", "-f", &save.to_string_lossy()]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("magic: SC"));
    assert!(stdout.contains("icon frames: 1"));
    assert!(stdout.contains("declared blocks: 3"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn info_json_is_parseable() {
    let dir = temp_dir("cardlink_info_json");
    let save = dir.join("save.bin");
    write_save(&save, 2, 0);

    let output = run_cli(&["info", "--json", "-f", &save.to_string_lossy()]);
    assert!(output.status.success());

    let json: Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be valid JSON");
    assert_eq!(json["magic_ok"], true);
    assert_eq!(json["declared_blocks"], 2);
    assert_eq!(json["file_len"], 2 * BLOCK_SIZE);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn patch_writes_the_selected_language_payload() {
    let dir = temp_dir("cardlink_patch");
    let save = dir.join("save.bin");
    let manifest = dir.join("patches.json");
    write_save(&save, 1, 0);
    write_patches_manifest(&manifest);

    let output = run_cli(&[
        "patch",
        "-f",
        &save.to_string_lossy(),
        "-m",
        &manifest.to_string_lossy(),
        "-l",
        "english",
    ]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("applied 1 patches for 'english' (2 bytes), 1 skipped"));

    let bytes = fs::read(&save).expect("save should still exist");
    assert_eq!(&bytes[0x100..0x102], &[0xDE, 0xAD]);
    assert_eq!(bytes[0x200], 0x00);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn patch_dry_run_plans_without_touching_the_file() {
    let dir = temp_dir("cardlink_patch_dry");
    let save = dir.join("save.bin");
    let manifest = dir.join("patches.json");
    write_save(&save, 1, 0);
    write_patches_manifest(&manifest);
    let before = fs::read(&save).expect("fixture should read");

    let output = run_cli(&[
        "patch",
        "--dry-run",
        "-f",
        &save.to_string_lossy(),
        "-m",
        &manifest.to_string_lossy(),
        "-l",
        "english",
    ]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("plan banner: 2 bytes at 0x0100"));
    assert!(stdout.contains("would apply"));
    assert_eq!(fs::read(&save).expect("save should still exist"), before);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn patch_respects_the_mcs_header_offset() {
    let dir = temp_dir("cardlink_patch_mcs");
    let save = dir.join("save.mcs");
    let manifest = dir.join("patches.json");
    write_save(&save, 1, 0x80);
    write_patches_manifest(&manifest);

    let output = run_cli(&[
        "patch",
        "--mcs",
        "-f",
        &save.to_string_lossy(),
        "-m",
        &manifest.to_string_lossy(),
        "-l",
        "english",
    ]);
    assert!(output.status.success());

    let bytes = fs::read(&save).expect("save should still exist");
    assert_eq!(&bytes[0x180..0x182], &[0xDE, 0xAD]);
    assert_eq!(&bytes[0x100..0x102], &[0x00, 0x00]);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn names_links_grows_and_updates_block_count() {
    let dir = temp_dir("cardlink_names");
    let save = dir.join("save.bin");
    let manifest = dir.join("cards.json");
    write_save(&save, 4, 0);
    write_cards_manifest(&manifest);

    let output = run_cli(&[
        "names",
        "-f",
        &save.to_string_lossy(),
        "-m",
        &manifest.to_string_lossy(),
        "-l",
        "english",
    ]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("linked 2 cards for 'english'"));
    assert!(stdout.contains("block count 4 -> 5"));

    let bytes = fs::read(&save).expect("save should still exist");
    assert_eq!(bytes.len(), 5 * BLOCK_SIZE);
    assert_eq!(bytes[0x03], 5);
    // lookup pointer -> memory base + table start
    assert_eq!(&bytes[0x2A7C..0x2A80], &0x0200_8000u32.to_le_bytes());
    // two pointer words then the concatenated names
    assert_eq!(&bytes[0x8000..0x8004], &0x0200_0000u32.to_le_bytes());
    assert_eq!(&bytes[0x8004..0x8008], &0x0200_0002u32.to_le_bytes());
    assert_eq!(&bytes[0x8008..0x800C], b"ABCA");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn names_dry_run_reports_but_does_not_modify() {
    let dir = temp_dir("cardlink_names_dry");
    let save = dir.join("save.bin");
    let manifest = dir.join("cards.json");
    write_save(&save, 4, 0);
    write_cards_manifest(&manifest);
    let before = fs::read(&save).expect("fixture should read");

    let output = run_cli(&[
        "names",
        "--dry-run",
        "--json",
        "-f",
        &save.to_string_lossy(),
        "-m",
        &manifest.to_string_lossy(),
        "-l",
        "english",
    ]);
    assert!(output.status.success());

    let json: Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be valid JSON");
    assert_eq!(json["cards"], 2);
    assert_eq!(json["blocks_before"], 4);
    assert_eq!(json["blocks_after"], 5);
    assert_eq!(json["dry_run"], true);
    assert_eq!(fs::read(&save).expect("save should still exist"), before);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn names_rejects_unknown_language() {
    let dir = temp_dir("cardlink_names_lang");
    let save = dir.join("save.bin");
    let manifest = dir.join("cards.json");
    write_save(&save, 4, 0);
    write_cards_manifest(&manifest);

    let output = run_cli(&[
        "names",
        "-f",
        &save.to_string_lossy(),
        "-m",
        &manifest.to_string_lossy(),
        "-l",
        "klingon",
    ]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error:"));
    assert!(stderr.contains("english"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn gfx_extract_then_pack_round_trips_the_slot() {
    let dir = temp_dir("cardlink_gfx");
    let save = dir.join("save.bin");
    let manifest = dir.join("gfx.json");
    write_save(&save, 1, 0);
    fs::write(
        &manifest,
        r#"{
            "version": 1,
            "assets": [
                {"name": "icon", "offset": "0x400", "width": 8, "height": 8,
                 "mode": "grid", "image": "icon.pgm"}
            ]
        }"#,
    )
    .expect("should write gfx manifest");

    // Seed the 8-byte slot with a recognizable pattern.
    let pattern = [0x81u8, 0x42, 0x24, 0x18, 0x18, 0x24, 0x42, 0x81];
    let mut bytes = fs::read(&save).expect("fixture should read");
    bytes[0x400..0x408].copy_from_slice(&pattern);
    fs::write(&save, &bytes).expect("should reseed save");

    let output = run_cli(&[
        "gfx",
        "--extract",
        "-f",
        &save.to_string_lossy(),
        "-m",
        &manifest.to_string_lossy(),
        "-d",
        &dir.to_string_lossy(),
    ]);
    assert!(output.status.success());
    assert!(dir.join("icon.pgm").exists());

    // Erase the slot, then pack the extracted image back in.
    let mut bytes = fs::read(&save).expect("save should still exist");
    bytes[0x400..0x408].fill(0);
    fs::write(&save, &bytes).expect("should erase slot");

    let output = run_cli(&[
        "gfx",
        "--pack",
        "-f",
        &save.to_string_lossy(),
        "-m",
        &manifest.to_string_lossy(),
        "-d",
        &dir.to_string_lossy(),
    ]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("packed icon: 8 bytes"));

    let bytes = fs::read(&save).expect("save should still exist");
    assert_eq!(&bytes[0x400..0x408], &pattern);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn gfx_pack_rejects_mismatched_image_dimensions() {
    let dir = temp_dir("cardlink_gfx_dims");
    let save = dir.join("save.bin");
    let manifest = dir.join("gfx.json");
    write_save(&save, 1, 0);
    fs::write(
        &manifest,
        r#"{"assets": [
            {"name": "icon", "offset": "0x400", "width": 8, "height": 8,
             "image": "icon.pgm"}
        ]}"#,
    )
    .expect("should write gfx manifest");
    // 4x4 image where the manifest declares 8x8
    let mut pgm = b"P5\n4 4\n255\n".to_vec();
    pgm.extend_from_slice(&[0u8; 16]);
    fs::write(dir.join("icon.pgm"), pgm).expect("should write pgm fixture");
    let before = fs::read(&save).expect("fixture should read");

    let output = run_cli(&[
        "gfx",
        "--pack",
        "-f",
        &save.to_string_lossy(),
        "-m",
        &manifest.to_string_lossy(),
        "-d",
        &dir.to_string_lossy(),
    ]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("4x4"));
    assert_eq!(fs::read(&save).expect("save should still exist"), before);

    let _ = fs::remove_dir_all(&dir);
}
