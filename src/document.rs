//! Property-list documents: value model, encoding, and decoding.
//!
//! A [`CompiledDocument`] is the full content of one target file. Keys are
//! held in a [`BTreeMap`] so that encoding is byte-for-byte deterministic.
use std::collections::BTreeMap;
use std::io::Cursor;

use serde::Deserialize;

use crate::error::PatchError;

/// A value that may appear in a compiled document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentValue {
    /// `<true/>` / `<false/>`.
    Boolean(bool),
    /// Signed integer.
    Integer(i64),
    /// UTF-8 string.
    String(String),
    /// Ordered list of strings.
    List(Vec<String>),
    /// Nested dictionary.
    Map(BTreeMap<String, DocumentValue>),
}

impl DocumentValue {
    /// Convert a TOML value from the settings file.
    ///
    /// # Errors
    ///
    /// Returns [`PatchError::UnsupportedValueType`] for floats, datetimes, and
    /// arrays containing anything other than strings.
    pub fn from_toml(key: &str, value: &toml::Value) -> Result<Self, PatchError> {
        match value {
            toml::Value::Boolean(b) => Ok(Self::Boolean(*b)),
            toml::Value::Integer(i) => Ok(Self::Integer(*i)),
            toml::Value::String(s) => Ok(Self::String(s.clone())),
            toml::Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    toml::Value::String(s) => Ok(s.clone()),
                    other => Err(unsupported(key, other.type_str())),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Self::List),
            toml::Value::Table(table) => table
                .iter()
                .map(|(k, v)| Ok((k.clone(), Self::from_toml(k, v)?)))
                .collect::<Result<BTreeMap<_, _>, PatchError>>()
                .map(Self::Map),
            other => Err(unsupported(key, other.type_str())),
        }
    }

    /// Return the boolean payload, if this is a boolean.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Return the string payload, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    fn to_plist(&self) -> plist::Value {
        match self {
            Self::Boolean(b) => plist::Value::Boolean(*b),
            Self::Integer(i) => plist::Value::Integer((*i).into()),
            Self::String(s) => plist::Value::String(s.clone()),
            Self::List(items) => {
                plist::Value::Array(items.iter().cloned().map(plist::Value::String).collect())
            }
            Self::Map(map) => plist::Value::Dictionary(to_dictionary(map)),
        }
    }

    fn from_plist(key: &str, value: plist::Value) -> Result<Self, PatchError> {
        match value {
            plist::Value::Boolean(b) => Ok(Self::Boolean(b)),
            plist::Value::Integer(i) => i
                .as_signed()
                .map(Self::Integer)
                .ok_or_else(|| unsupported(key, "unsigned integer")),
            plist::Value::String(s) => Ok(Self::String(s)),
            plist::Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    plist::Value::String(s) => Ok(s),
                    other => Err(unsupported(key, plist_kind(&other))),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Self::List),
            plist::Value::Dictionary(dict) => from_dictionary(dict).map(Self::Map),
            other => Err(unsupported(key, plist_kind(&other))),
        }
    }
}

impl From<bool> for DocumentValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<i64> for DocumentValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<&str> for DocumentValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for DocumentValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vec<String>> for DocumentValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

/// Serialization flavour for encoded documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// Human-readable XML property list.
    #[default]
    Xml,
    /// Compact `bplist00` binary property list.
    Binary,
}

/// The full content of one target file after merge.
///
/// Built by the compiler (or from a fixed table) and never mutated afterwards
/// by callers outside this crate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledDocument {
    entries: BTreeMap<String, DocumentValue>,
}

impl CompiledDocument {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, key: impl Into<String>, value: DocumentValue) {
        self.entries.insert(key.into(), value);
    }

    pub(crate) fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }

    /// Look up a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&DocumentValue> {
        self.entries.get(key)
    }

    /// Returns `true` if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of top-level keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the document has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterate over entries in sorted key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DocumentValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, DocumentValue)> for CompiledDocument {
    fn from_iter<I: IntoIterator<Item = (K, DocumentValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Encode a document as a property list.
///
/// # Errors
///
/// Returns [`PatchError::EncodingFailure`] if the serializer fails.
pub fn encode(document: &CompiledDocument, format: DocumentFormat) -> Result<Vec<u8>, PatchError> {
    let value = plist::Value::Dictionary(to_dictionary(&document.entries));
    let mut buf = Vec::new();
    match format {
        DocumentFormat::Xml => value.to_writer_xml(&mut buf)?,
        DocumentFormat::Binary => value.to_writer_binary(&mut buf)?,
    }
    Ok(buf)
}

/// Decode an XML or binary property list into a document.
///
/// The format is detected from the content.
///
/// # Errors
///
/// Returns [`PatchError::EncodingFailure`] for malformed input and
/// [`PatchError::UnsupportedValueType`] if the root is not a dictionary or a
/// value falls outside the supported set.
pub fn decode(bytes: &[u8]) -> Result<CompiledDocument, PatchError> {
    match plist::Value::from_reader(Cursor::new(bytes))? {
        plist::Value::Dictionary(dict) => Ok(CompiledDocument {
            entries: from_dictionary(dict)?,
        }),
        other => Err(unsupported("<root>", plist_kind(&other))),
    }
}

fn to_dictionary(map: &BTreeMap<String, DocumentValue>) -> plist::Dictionary {
    let mut dict = plist::Dictionary::new();
    for (key, value) in map {
        dict.insert(key.clone(), value.to_plist());
    }
    dict
}

fn from_dictionary(dict: plist::Dictionary) -> Result<BTreeMap<String, DocumentValue>, PatchError> {
    dict.into_iter()
        .map(|(key, value)| {
            let converted = DocumentValue::from_plist(&key, value)?;
            Ok((key, converted))
        })
        .collect()
}

const fn plist_kind(value: &plist::Value) -> &'static str {
    match value {
        plist::Value::Array(_) => "array",
        plist::Value::Dictionary(_) => "dictionary",
        plist::Value::Boolean(_) => "boolean",
        plist::Value::Data(_) => "data",
        plist::Value::Date(_) => "date",
        plist::Value::Real(_) => "real",
        plist::Value::Integer(_) => "integer",
        plist::Value::String(_) => "string",
        _ => "unknown",
    }
}

fn unsupported(key: &str, kind: &'static str) -> PatchError {
    PatchError::UnsupportedValueType {
        key: key.to_string(),
        kind,
    }
}
