//! Typed, validated models of the three manifest kinds.
//!
//! Manifests are authored as JSON with the conventions of the original
//! tooling: numeric fields accept either plain integers or `"0x"` hex
//! strings, payload bytes are space-separated hex (`"FA 21 00"`) or arrays.
//! Deserialization normalizes both forms; `validate()` enforces the
//! invariants that are checkable statically.

pub mod cards;
pub mod graphics;
pub mod patches;

use std::fmt;

use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::Deserialize;

pub use cards::{CardRecord, CardsManifest, LanguageSection};
pub use graphics::{GraphicsEntry, GraphicsManifest};
pub use patches::{PatchEntry, PatchesManifest};

pub(crate) fn default_true() -> bool {
    true
}

fn parse_int_str(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
    } else {
        s.parse::<u64>()
    };
    parsed.map_err(|_| format!("invalid integer {s:?} (decimal or 0x-hex expected)"))
}

/// Deserialize an integer given as a JSON number or a `"0x"` hex string.
pub(crate) fn hex_or_int<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    struct IntVisitor;

    impl<'de> Visitor<'de> for IntVisitor {
        type Value = u64;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("an integer or a hex string like \"0x8000\"")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<u64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<u64, E> {
            u64::try_from(v).map_err(|_| E::custom(format!("negative offset {v}")))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<u64, E> {
            parse_int_str(v).map_err(E::custom)
        }
    }

    deserializer.deserialize_any(IntVisitor)
}

pub(crate) fn hex_or_int_usize<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let v = hex_or_int(deserializer)?;
    usize::try_from(v).map_err(|_| de::Error::custom(format!("offset {v} out of range")))
}

pub(crate) fn hex_or_int_u16<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    let v = hex_or_int(deserializer)?;
    u16::try_from(v).map_err(|_| de::Error::custom(format!("value {v} does not fit in 16 bits")))
}

pub(crate) fn opt_hex_or_int_usize<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "hex_or_int_usize")] usize);

    Option::<Wrapper>::deserialize(deserializer).map(|opt| opt.map(|w| w.0))
}

/// Payload bytes: `"DE AD BE EF"`, `"DE,AD,BE,EF"`, or `[222, "0xAD", "BE"]`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HexBytes(pub Vec<u8>);

impl HexBytes {
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn parse_hex_byte(s: &str) -> Result<u8, String> {
    let s = s.trim();
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u8::from_str_radix(digits, 16).map_err(|_| format!("invalid hex byte {s:?}"))
}

impl<'de> Deserialize<'de> for HexBytes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct BytesVisitor;

        impl<'de> Visitor<'de> for BytesVisitor {
            type Value = HexBytes;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a hex byte string like \"DE AD BE EF\" or an array of bytes")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<HexBytes, E> {
                let mut out = Vec::new();
                for part in v.split([' ', ',']).filter(|p| !p.is_empty()) {
                    out.push(parse_hex_byte(part).map_err(E::custom)?);
                }
                Ok(HexBytes(out))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<HexBytes, A::Error> {
                #[derive(Deserialize)]
                #[serde(untagged)]
                enum Item {
                    Int(u64),
                    Str(String),
                }

                let mut out = Vec::new();
                while let Some(item) = seq.next_element::<Item>()? {
                    let byte = match item {
                        Item::Int(v) => u8::try_from(v).map_err(|_| {
                            de::Error::custom(format!("byte value {v} out of range"))
                        })?,
                        Item::Str(s) => parse_hex_byte(&s).map_err(de::Error::custom)?,
                    };
                    out.push(byte);
                }
                Ok(HexBytes(out))
            }
        }

        deserializer.deserialize_any(BytesVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct OffsetHolder {
        #[serde(deserialize_with = "hex_or_int_usize")]
        offset: usize,
    }

    #[test]
    fn offsets_accept_decimal_and_hex() {
        let a: OffsetHolder = serde_json::from_str(r#"{"offset": 32768}"#).unwrap();
        let b: OffsetHolder = serde_json::from_str(r#"{"offset": "0x8000"}"#).unwrap();
        assert_eq!(a.offset, 0x8000);
        assert_eq!(b.offset, 0x8000);
    }

    #[test]
    fn offsets_reject_garbage() {
        assert!(serde_json::from_str::<OffsetHolder>(r#"{"offset": "0xZZ"}"#).is_err());
        assert!(serde_json::from_str::<OffsetHolder>(r#"{"offset": -4}"#).is_err());
    }

    #[test]
    fn hex_bytes_accept_string_and_array_forms() {
        let s: HexBytes = serde_json::from_str(r#""FA 21 00""#).unwrap();
        assert_eq!(s.0, vec![0xFA, 0x21, 0x00]);
        let c: HexBytes = serde_json::from_str(r#""DE,AD,BE,EF""#).unwrap();
        assert_eq!(c.0, vec![0xDE, 0xAD, 0xBE, 0xEF]);
        let a: HexBytes = serde_json::from_str(r#"[222, "0xAD", "BE"]"#).unwrap();
        assert_eq!(a.0, vec![0xDE, 0xAD, 0xBE]);
    }

    #[test]
    fn hex_bytes_reject_oversized_values() {
        assert!(serde_json::from_str::<HexBytes>(r#"[256]"#).is_err());
        assert!(serde_json::from_str::<HexBytes>(r#""GG""#).is_err());
    }
}
