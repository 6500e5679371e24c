//! Tile graphics codec: 2-colour bitmaps <-> the device's packed 1-bit
//! tiled representation.
//!
//! The native format stores 8 pixels per byte, MSB first, and mirrors each
//! 8x8 tile horizontally. Because one tile row is exactly one byte, the
//! mirror is a bit-reversal of every packed byte; pack and extract apply
//! the same reversal so a round trip cancels out.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// How tiles are ordered across the packed stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileMode {
    /// Tiles concatenated in row-major scan order, each tile's 8 row bytes
    /// contiguous. Used for glyph strips.
    Linear,
    /// Image rows emitted left to right, respecting the pixel width. Used
    /// for multi-row icon and menu graphics.
    #[default]
    Grid,
}

/// A 2-colour pixel image. `0` = light, `1` = dark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: usize,
    pub height: usize,
    pixels: Vec<u8>,
}

const TILE: usize = 8;

static REVERSE_TABLE: [u8; 256] = build_reverse_table();

const fn build_reverse_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut b = 0usize;
    while b < 256 {
        let mut v = b as u8;
        v = (v & 0xF0) >> 4 | (v & 0x0F) << 4;
        v = (v & 0xCC) >> 2 | (v & 0x33) << 2;
        v = (v & 0xAA) >> 1 | (v & 0x55) << 1;
        table[b] = v;
        b += 1;
    }
    table
}

/// Reverse the bit order of one packed byte (mirror of one 8-pixel row).
pub fn mirror_row(byte: u8) -> u8 {
    REVERSE_TABLE[byte as usize]
}

/// Packed byte length implied by a width x height slot.
pub fn slot_size(width: usize, height: usize) -> usize {
    width * height / 8
}

impl Bitmap {
    pub fn new(width: usize, height: usize, pixels: Vec<u8>) -> CoreResult<Self> {
        if pixels.len() != width * height {
            return Err(CoreError::capacity(format!(
                "bitmap pixel count {} does not match {width}x{height}",
                pixels.len()
            )));
        }
        if let Some(bad) = pixels.iter().find(|&&p| p > 1) {
            return Err(CoreError::capacity(format!(
                "bitmap pixel value {bad} outside 0..=1"
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Quantize an 8-bit luminance buffer: values at or above the midpoint
    /// become colour 0 (light), everything darker becomes 1.
    pub fn from_luma(width: usize, height: usize, luma: &[u8]) -> CoreResult<Self> {
        if luma.len() != width * height {
            return Err(CoreError::capacity(format!(
                "luminance buffer length {} does not match {width}x{height}",
                luma.len()
            )));
        }
        let pixels = luma.iter().map(|&v| if v >= 128 { 0 } else { 1 }).collect();
        Self::new(width, height, pixels)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        self.pixels[y * self.width + x]
    }

    /// Pixel colour 1 rendered dark, 0 light, as 8-bit luminance.
    pub fn to_luma(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .map(|&p| if p == 0 { 0xFF } else { 0x00 })
            .collect()
    }
}

fn check_tile_dims(width: usize, height: usize) -> CoreResult<()> {
    if width == 0 || height == 0 || width % TILE != 0 || height % TILE != 0 {
        return Err(CoreError::capacity(format!(
            "image dimensions {width}x{height} are not positive multiples of {TILE}"
        )));
    }
    Ok(())
}

/// Pack a bitmap into the device's mirrored 1bpp representation.
pub fn pack(bitmap: &Bitmap, mode: TileMode) -> CoreResult<Vec<u8>> {
    check_tile_dims(bitmap.width, bitmap.height)?;

    let bytes_per_row = bitmap.width / TILE;
    let mut out = Vec::with_capacity(slot_size(bitmap.width, bitmap.height));

    match mode {
        TileMode::Grid => {
            for y in 0..bitmap.height {
                for bx in 0..bytes_per_row {
                    out.push(pack_row_byte(bitmap, bx * TILE, y));
                }
            }
        }
        TileMode::Linear => {
            for ty in 0..bitmap.height / TILE {
                for tx in 0..bytes_per_row {
                    for row in 0..TILE {
                        out.push(pack_row_byte(bitmap, tx * TILE, ty * TILE + row));
                    }
                }
            }
        }
    }

    Ok(out)
}

/// Rebuild a human-viewable bitmap from packed bytes. Exact inverse of
/// [`pack`]; the input length must equal the implied slot size.
pub fn extract(data: &[u8], width: usize, height: usize, mode: TileMode) -> CoreResult<Bitmap> {
    check_tile_dims(width, height)?;

    let expected = slot_size(width, height);
    if data.len() != expected {
        return Err(CoreError::capacity(format!(
            "packed data is {} bytes, {width}x{height} slot requires exactly {expected}",
            data.len()
        )));
    }

    let bytes_per_row = width / TILE;
    let mut pixels = vec![0u8; width * height];
    let mut unpack = |byte: u8, x0: usize, y: usize| {
        let mirrored = mirror_row(byte);
        for bit in 0..TILE {
            pixels[y * width + x0 + bit] = mirrored >> (7 - bit) & 1;
        }
    };

    match mode {
        TileMode::Grid => {
            for y in 0..height {
                for bx in 0..bytes_per_row {
                    unpack(data[y * bytes_per_row + bx], bx * TILE, y);
                }
            }
        }
        TileMode::Linear => {
            let mut i = 0;
            for ty in 0..height / TILE {
                for tx in 0..bytes_per_row {
                    for row in 0..TILE {
                        unpack(data[i], tx * TILE, ty * TILE + row);
                        i += 1;
                    }
                }
            }
        }
    }

    Bitmap::new(width, height, pixels)
}

fn pack_row_byte(bitmap: &Bitmap, x0: usize, y: usize) -> u8 {
    let mut byte = 0u8;
    for bit in 0..TILE {
        if bitmap.pixel(x0 + bit, y) == 1 {
            byte |= 1 << (7 - bit);
        }
    }
    mirror_row(byte)
}
