use std::error::Error;
use std::fmt;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreErrorKind {
    /// Malformed manifest: missing fields, duplicate card numbers,
    /// duplicate active patch offsets for one language.
    Manifest,
    /// A character has no mapping in the active encoding table.
    Encoding,
    /// A fixed slot size mismatch, a name offset overflowing 16 bits, or
    /// table growth beyond the maximum block count.
    Capacity,
    /// A resolved physical offset (or offset+length) outside the image.
    Bounds,
    /// A post-write readback did not match the intended payload.
    Verification,
    Io,
}

impl fmt::Display for CoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CoreErrorKind::Manifest => "manifest",
            CoreErrorKind::Encoding => "encoding",
            CoreErrorKind::Capacity => "capacity",
            CoreErrorKind::Bounds => "bounds",
            CoreErrorKind::Verification => "verification",
            CoreErrorKind::Io => "io",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreError {
    pub kind: CoreErrorKind,
    pub message: String,
}

impl CoreError {
    pub fn new(kind: CoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn manifest(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Manifest, message)
    }

    pub fn encoding(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Encoding, message)
    }

    pub fn capacity(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Capacity, message)
    }

    pub fn bounds(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Bounds, message)
    }

    pub fn verification(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Verification, message)
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl Error for CoreError {}

impl From<io::Error> for CoreError {
    fn from(err: io::Error) -> Self {
        Self::new(CoreErrorKind::Io, err.to_string())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
