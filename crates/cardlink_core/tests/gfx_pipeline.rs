//! Codec + packer working against a real image buffer, the way the
//! graphics pipeline stages run them.

use cardlink_core::gfx::{self, Bitmap, TileMode};
use cardlink_core::layout::BLOCK_SIZE;
use cardlink_core::manifest::GraphicsManifest;
use cardlink_core::packer;
use cardlink_core::save::{BaseMode, SaveImage};

fn manifest() -> GraphicsManifest {
    GraphicsManifest::from_str(
        r#"{
            "assets": [
                {"name": "title", "offset": "0x63C8", "width": 32, "height": 16,
                 "mode": "grid", "image": "gfx/title.pgm"},
                {"name": "glyphs", "offset": "0x7000", "width": 16, "height": 8,
                 "mode": "linear", "image": "gfx/glyphs.pgm", "count": 3}
            ]
        }"#,
    )
    .unwrap()
}

fn diagonal(width: usize, height: usize) -> Bitmap {
    let pixels = (0..width * height)
        .map(|i| u8::from(i % width == (i / width) % width))
        .collect();
    Bitmap::new(width, height, pixels).unwrap()
}

#[test]
fn pack_embed_read_extract_round_trips() {
    let manifest = manifest();
    let entry = &manifest.assets[0];
    let mut image = SaveImage::from_bytes(vec![0u8; 4 * BLOCK_SIZE], BaseMode::Raw).unwrap();

    let original = diagonal(entry.width, entry.height);
    let packed = gfx::pack(&original, entry.mode).unwrap();
    packer::embed(&mut image, entry, &packed).unwrap();

    let stored = packer::read(&image, entry).unwrap();
    let restored = gfx::extract(&stored, entry.width, entry.height, entry.mode).unwrap();
    assert_eq!(restored, original);
}

#[test]
fn sequence_frames_round_trip_independently() {
    let manifest = manifest();
    let entry = &manifest.assets[1];
    let mut image = SaveImage::from_bytes(vec![0u8; 4 * BLOCK_SIZE], BaseMode::Raw).unwrap();

    let frames: Vec<Bitmap> = (0..entry.frame_count())
        .map(|i| {
            let pixels = (0..entry.width * entry.height)
                .map(|p| u8::from((p + i) % 3 == 0))
                .collect();
            Bitmap::new(entry.width, entry.height, pixels).unwrap()
        })
        .collect();

    for (i, frame) in frames.iter().enumerate() {
        let packed = gfx::pack(frame, entry.mode).unwrap();
        packer::embed_frame(&mut image, entry, i, &packed).unwrap();
    }

    for (i, frame) in frames.iter().enumerate() {
        let stored = packer::read_frame(&image, entry, i).unwrap();
        let restored = gfx::extract(&stored, entry.width, entry.height, entry.mode).unwrap();
        assert_eq!(&restored, frame, "frame {i}");
    }
}

#[test]
fn embedding_under_both_base_modes_yields_identical_content() {
    let manifest = manifest();
    let entry = &manifest.assets[0];
    let packed = gfx::pack(&diagonal(entry.width, entry.height), entry.mode).unwrap();

    let mut raw = SaveImage::from_bytes(vec![0u8; 4 * BLOCK_SIZE], BaseMode::Raw).unwrap();
    let mcs_len = BaseMode::Mcs.delta() as usize + 4 * BLOCK_SIZE;
    let mut mcs = SaveImage::from_bytes(vec![0u8; mcs_len], BaseMode::Mcs).unwrap();

    packer::embed(&mut raw, entry, &packed).unwrap();
    packer::embed(&mut mcs, entry, &packed).unwrap();

    let delta = BaseMode::Mcs.delta() as usize;
    assert_eq!(&raw.as_bytes()[..], &mcs.as_bytes()[delta..]);
}
