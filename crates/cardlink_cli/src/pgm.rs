//! Minimal binary PGM (P5) reader/writer: the portable authoring format
//! the graphics pipeline round-trips through.

use std::fs;
use std::io::{self, Write as _};
use std::path::Path;

pub fn write(path: &Path, width: usize, height: usize, luma: &[u8]) -> io::Result<()> {
    if luma.len() != width * height {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "pixel buffer length {} does not match {width}x{height}",
                luma.len()
            ),
        ));
    }
    let mut out = Vec::with_capacity(luma.len() + 32);
    write!(out, "P5\n{width} {height}\n255\n")?;
    out.extend_from_slice(luma);
    fs::write(path, out)
}

pub fn read(path: &Path) -> io::Result<(usize, usize, Vec<u8>)> {
    let bytes = fs::read(path)?;
    let mut pos = 0usize;

    let magic = next_token(&bytes, &mut pos)?;
    if magic != b"P5" {
        return Err(invalid(path, "not a binary PGM (P5) file"));
    }
    let width = parse_dim(path, next_token(&bytes, &mut pos)?)?;
    let height = parse_dim(path, next_token(&bytes, &mut pos)?)?;
    let maxval = parse_dim(path, next_token(&bytes, &mut pos)?)?;
    if maxval == 0 || maxval > 255 {
        return Err(invalid(path, "only 8-bit PGM is supported"));
    }

    // Exactly one whitespace byte separates the header from the raster.
    pos += 1;
    let expected = width * height;
    if bytes.len() < pos || bytes.len() - pos < expected {
        return Err(invalid(path, "truncated pixel data"));
    }
    Ok((width, height, bytes[pos..pos + expected].to_vec()))
}

/// Advance past whitespace and `#` comments, returning the next token.
fn next_token<'a>(bytes: &'a [u8], pos: &mut usize) -> io::Result<&'a [u8]> {
    loop {
        while *pos < bytes.len() && bytes[*pos].is_ascii_whitespace() {
            *pos += 1;
        }
        if *pos < bytes.len() && bytes[*pos] == b'#' {
            while *pos < bytes.len() && bytes[*pos] != b'\n' {
                *pos += 1;
            }
            continue;
        }
        break;
    }
    let start = *pos;
    while *pos < bytes.len() && !bytes[*pos].is_ascii_whitespace() {
        *pos += 1;
    }
    if start == *pos {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "truncated PGM header",
        ));
    }
    Ok(&bytes[start..*pos])
}

fn parse_dim(path: &Path, token: &[u8]) -> io::Result<usize> {
    std::str::from_utf8(token)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| invalid(path, "malformed PGM header field"))
}

fn invalid(path: &Path, detail: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("{}: {detail}", path.display()),
    )
}
