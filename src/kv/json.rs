//! JSON adapter for key-value trees.
//!
//! Lets a physics tree exported to JSON by an external tool stand in for the
//! binary key-value decoder. JSON has no binary type, so blobs are written as
//! strings in the key-value text notation:
//!
//! ```text
//! "m_Edges": "#[ 01 00 00 00 02 03 01 00 ]"
//! ```
//!
//! Whitespace between byte pairs is optional. All other strings stay strings.

use serde_json::Value;

use super::{KeyValueDecoder, KvValue};
use crate::error::{ExtractError, Result};

/// Decodes UTF-8 JSON documents into [`KvValue`] trees.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonKvDecoder;

impl KeyValueDecoder for JsonKvDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<KvValue> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|e| ExtractError::Decode(e.to_string()))?;
        from_json(value)
    }
}

/// Convert a parsed JSON value into a key-value tree.
pub fn from_json(value: Value) -> Result<KvValue> {
    Ok(match value {
        Value::Null => KvValue::Null,
        Value::Bool(b) => KvValue::Bool(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => KvValue::Int(i),
            None => KvValue::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => match parse_blob(&s) {
            Some(bytes) => KvValue::Bytes(bytes?),
            None => KvValue::Str(s),
        },
        Value::Array(items) => {
            KvValue::Array(items.into_iter().map(from_json).collect::<Result<Vec<_>>>()?)
        }
        Value::Object(entries) => KvValue::Map(
            entries
                .into_iter()
                .map(|(k, v)| Ok((k, from_json(v)?)))
                .collect::<Result<_>>()?,
        ),
    })
}

/// Parse a `#[ .. ]` blob literal.
///
/// Returns `None` when `s` is not a blob literal at all, and an error when it
/// is one but holds something other than hex byte pairs.
fn parse_blob(s: &str) -> Option<Result<Vec<u8>>> {
    let body = s.trim().strip_prefix("#[")?.strip_suffix(']')?;
    let digits: Vec<u8> = body.bytes().filter(|b| !b.is_ascii_whitespace()).collect();

    if digits.len() % 2 != 0 {
        return Some(Err(ExtractError::Decode(format!(
            "blob literal has an odd number of hex digits ({})",
            digits.len()
        ))));
    }

    Some(
        digits
            .chunks_exact(2)
            .map(|pair| {
                std::str::from_utf8(pair)
                    .ok()
                    .and_then(|p| u8::from_str_radix(p, 16).ok())
                    .ok_or_else(|| {
                        ExtractError::Decode(format!(
                            "invalid hex byte {:?} in blob literal",
                            String::from_utf8_lossy(pair)
                        ))
                    })
            })
            .collect(),
    )
}
