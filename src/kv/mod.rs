//! Decoded key-value trees.
//!
//! Physics data arrives as a nested key-value document. Decoding the binary
//! document format is the job of an external [`KeyValueDecoder`]; this module
//! defines the tree it produces ([`KvValue`]) and the lookup operations the
//! extractor needs.
//!
//! Lookups never fail: a missing key, an index past the end of an array or a
//! step into a scalar all yield `None`. The extractor relies on this to end
//! its part scans.
//!
//! ```
//! use phystri::kv::{KvValue, PathStep};
//!
//! let tree = KvValue::map([(
//!     "m_parts",
//!     KvValue::Array(vec![KvValue::map([("m_nCollisionAttributeIndex", KvValue::Int(0))])]),
//! )]);
//!
//! let path = [PathStep::Key("m_parts"), PathStep::Index(0), PathStep::Key("m_nCollisionAttributeIndex")];
//! assert_eq!(tree.lookup(&path).and_then(KvValue::as_int), Some(0));
//!
//! let past_end = [PathStep::Key("m_parts"), PathStep::Index(1)];
//! assert!(tree.lookup(&past_end).is_none());
//! ```

pub mod json;

use std::collections::BTreeMap;
use std::fmt;

use crate::error::Result;

pub use json::JsonKvDecoder;

/// A node of a decoded key-value tree.
#[derive(Debug, Clone, PartialEq)]
pub enum KvValue {
    /// Explicit null.
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Integer scalar.
    Int(i64),
    /// Floating point scalar.
    Float(f64),
    /// String scalar.
    Str(String),
    /// Raw binary blob.
    Bytes(Vec<u8>),
    /// Ordered sequence.
    Array(Vec<KvValue>),
    /// Keyed mapping.
    Map(BTreeMap<String, KvValue>),
}

impl KvValue {
    /// Build a map node from key/value pairs.
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, KvValue)>,
    {
        KvValue::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Look up a key in a map node.
    pub fn get(&self, key: &str) -> Option<&KvValue> {
        match self {
            KvValue::Map(m) => m.get(key),
            _ => None,
        }
    }

    /// Look up an index in an array node.
    pub fn at(&self, index: usize) -> Option<&KvValue> {
        match self {
            KvValue::Array(items) => items.get(index),
            _ => None,
        }
    }

    /// Apply one path step.
    pub fn step(&self, step: &PathStep<'_>) -> Option<&KvValue> {
        match *step {
            PathStep::Key(key) => self.get(key),
            PathStep::Index(index) => self.at(index),
        }
    }

    /// Follow a path of steps from this node.
    pub fn lookup(&self, path: &[PathStep<'_>]) -> Option<&KvValue> {
        path.iter().try_fold(self, |node, step| node.step(step))
    }

    /// Integer value. Floats with no fractional part also qualify.
    pub fn as_int(&self) -> Option<i64> {
        match *self {
            KvValue::Int(v) => Some(v),
            KvValue::Float(v) if v.fract() == 0.0 && v.is_finite() => Some(v as i64),
            _ => None,
        }
    }

    /// Floating point value.
    pub fn as_float(&self) -> Option<f64> {
        match *self {
            KvValue::Float(v) => Some(v),
            KvValue::Int(v) => Some(v as f64),
            _ => None,
        }
    }

    /// String value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            KvValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Binary blob value.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            KvValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Array items.
    pub fn as_array(&self) -> Option<&[KvValue]> {
        match self {
            KvValue::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Map entries.
    pub fn as_map(&self) -> Option<&BTreeMap<String, KvValue>> {
        match self {
            KvValue::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Whether this node is [`KvValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, KvValue::Null)
    }
}

/// One step of a lookup path: a map key or an array index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStep<'a> {
    /// Map key.
    Key(&'a str),
    /// Array index.
    Index(usize),
}

impl<'a> From<&'a str> for PathStep<'a> {
    fn from(key: &'a str) -> Self {
        PathStep::Key(key)
    }
}

impl From<usize> for PathStep<'_> {
    fn from(index: usize) -> Self {
        PathStep::Index(index)
    }
}

/// Displays a path as `a[0].b.c[3]`.
pub struct DisplayPath<'p, 'a>(pub &'p [PathStep<'a>]);

impl fmt::Display for DisplayPath<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.0.iter().enumerate() {
            match step {
                PathStep::Key(key) if i == 0 => write!(f, "{}", key)?,
                PathStep::Key(key) => write!(f, ".{}", key)?,
                PathStep::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

/// Decodes a serialized key-value document into a [`KvValue`] tree.
///
/// The binary key-value format itself is decoded outside this crate;
/// implementors adapt such a decoder to this interface. Closures of the right
/// shape implement the trait directly.
pub trait KeyValueDecoder {
    /// Decode a full document.
    fn decode(&self, bytes: &[u8]) -> Result<KvValue>;
}

impl<F> KeyValueDecoder for F
where
    F: Fn(&[u8]) -> Result<KvValue>,
{
    fn decode(&self, bytes: &[u8]) -> Result<KvValue> {
        self(bytes)
    }
}
