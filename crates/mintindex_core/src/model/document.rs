//! Schema-less attribute document attached to fixed-schema records.
//!
//! # Responsibility
//! - Hold extensible per-entity configuration as ordered key/value entries.
//! - Provide copy-on-write transforms; no operation mutates `self`.
//! - Encode/decode the canonical JSON text persisted in record columns.
//!
//! # Invariants
//! - Keys are unique. Overwriting a key keeps its position; a removed and
//!   re-added key moves to the end.
//! - Array dedup and removal compare values by canonical text, so an element
//!   matches itself after a save and reload.
//! - Decoding never fails: malformed text yields an empty document.
//!
//! # Known limitation
//! The text encoding does not carry kind tags. Addresses and byte-strings decode
//! back as plain strings, so round-trips are equal by canonical text, not by kind.

use crate::model::address::Address;
use log::warn;
use num_bigint::BigInt;
use serde_json::{Map, Number, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One value stored in an [`AttributeDocument`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocValue {
    Null,
    Bool(bool),
    Int(BigInt),
    String(String),
    Address(Address),
    Bytes(Vec<u8>),
    Array(Vec<DocValue>),
    Object(AttributeDocument),
}

impl DocValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<&BigInt> {
        match self {
            Self::Int(value) => Some(value),
            _ => None,
        }
    }

    /// Returns string content for string-like kinds.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value.as_str()),
            Self::Address(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[DocValue]> {
        match self {
            Self::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Canonical text of this value, as it appears inside serialized documents.
    pub fn canonical_text(&self) -> String {
        self.to_json().to_string()
    }

    /// Whether both values serialize to the same text.
    pub fn same_stored_form(&self, other: &DocValue) -> bool {
        self.to_json() == other.to_json()
    }

    fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(value) => Value::Bool(*value),
            Self::Int(value) => {
                let digits = value.to_string();
                match serde_json::from_str::<Number>(digits.as_str()) {
                    Ok(number) => Value::Number(number),
                    Err(_) => Value::String(digits),
                }
            }
            Self::String(value) => Value::String(value.clone()),
            Self::Address(value) => Value::String(value.to_string()),
            Self::Bytes(bytes) => Value::String(encode_bytes(bytes)),
            Self::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Object(document) => Value::Object(document.to_json_map()),
        }
    }

    fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(value) => Self::Bool(value),
            Value::Number(number) => {
                let text = number.to_string();
                match text.parse::<BigInt>() {
                    Ok(value) => Self::Int(value),
                    // Non-integral numbers are kept verbatim.
                    Err(_) => Self::String(text),
                }
            }
            Value::String(value) => Self::String(value),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from_json).collect()),
            Value::Object(map) => Self::Object(AttributeDocument::from_json_map(map)),
        }
    }
}

impl From<bool> for DocValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<BigInt> for DocValue {
    fn from(value: BigInt) -> Self {
        Self::Int(value)
    }
}

impl From<i64> for DocValue {
    fn from(value: i64) -> Self {
        Self::Int(BigInt::from(value))
    }
}

impl From<&str> for DocValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for DocValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Address> for DocValue {
    fn from(value: Address) -> Self {
        Self::Address(value)
    }
}

impl From<Vec<u8>> for DocValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

/// Ordered, schema-less key/value document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeDocument {
    entries: Vec<(String, DocValue)>,
}

impl AttributeDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in document order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DocValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn get(&self, key: &str) -> Option<&DocValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Returns a copy with `key` inserted or overwritten in place.
    pub fn with_entry_set(&self, key: impl Into<String>, value: DocValue) -> Self {
        let key = key.into();
        let mut next = self.clone();
        match next.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = value,
            None => next.entries.push((key, value)),
        }
        next
    }

    /// Returns a copy without `key`; unchanged when the key is absent.
    pub fn with_entry_removed(&self, key: &str) -> Self {
        let mut next = self.clone();
        next.entries.retain(|(existing, _)| existing != key);
        next
    }

    /// Returns a copy with `value` appended to the array at `key`.
    ///
    /// A missing or non-array entry is replaced by a fresh array. Values whose
    /// canonical text is already present are not appended twice.
    pub fn with_array_value_added(&self, key: impl Into<String>, value: DocValue) -> Self {
        let key = key.into();
        let mut items = match self.get(key.as_str()) {
            Some(DocValue::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        if !items.iter().any(|item| item.same_stored_form(&value)) {
            items.push(value);
        }
        self.with_entry_set(key, DocValue::Array(items))
    }

    /// Returns a copy with the first element stored like `value` removed from the
    /// array at `key`. No-op when the entry is not an array or holds no match.
    pub fn with_array_value_removed(&self, key: &str, value: &DocValue) -> Self {
        let Some(DocValue::Array(items)) = self.get(key) else {
            return self.clone();
        };
        let Some(position) = items.iter().position(|item| item.same_stored_form(value)) else {
            return self.clone();
        };
        let mut items = items.clone();
        items.remove(position);
        self.with_entry_set(key, DocValue::Array(items))
    }

    /// Shallow merge: every key of `other` overwrites or extends `self`.
    pub fn merged_with(&self, other: &AttributeDocument) -> Self {
        other
            .iter()
            .fold(self.clone(), |acc, (key, value)| {
                acc.with_entry_set(key, value.clone())
            })
    }

    /// Encodes the document as canonical JSON object text.
    pub fn serialize(&self) -> String {
        Value::Object(self.to_json_map()).to_string()
    }

    /// Decodes stored text, degrading to an empty document on malformed input.
    pub fn deserialize(text: &str) -> Self {
        match Self::try_deserialize(text) {
            Ok(document) => document,
            Err(err) => {
                warn!(
                    "event=document_decode module=model status=error error_code=malformed_document error={}",
                    err
                );
                Self::new()
            }
        }
    }

    /// Strict decode used by callers that report malformed input themselves.
    ///
    /// Blank text is a valid empty document.
    pub fn try_deserialize(text: &str) -> Result<Self, DocumentError> {
        if text.trim().is_empty() {
            return Ok(Self::new());
        }
        let value: Value = serde_json::from_str(text)
            .map_err(|err| DocumentError::Malformed(err.to_string()))?;
        match value {
            Value::Object(map) => Ok(Self::from_json_map(map)),
            _ => Err(DocumentError::NotAnObject),
        }
    }

    /// Compares documents the way readers observe them after a round-trip:
    /// same key set, same canonical text per key.
    pub fn observationally_eq(&self, other: &AttributeDocument) -> bool {
        self.len() == other.len()
            && self.iter().all(|(key, value)| {
                other
                    .get(key)
                    .is_some_and(|candidate| candidate.canonical_text() == value.canonical_text())
            })
    }

    fn to_json_map(&self) -> Map<String, Value> {
        self.entries
            .iter()
            .map(|(key, value)| (key.clone(), value.to_json()))
            .collect()
    }

    fn from_json_map(map: Map<String, Value>) -> Self {
        Self {
            entries: map
                .into_iter()
                .map(|(key, value)| (key, DocValue::from_json(value)))
                .collect(),
        }
    }
}

fn encode_bytes(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => format!("0x{}", hex::encode(bytes)),
    }
}

/// Strict decode failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    Malformed(String),
    NotAnObject,
}

impl Display for DocumentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(message) => write!(f, "malformed attribute document: {message}"),
            Self::NotAnObject => write!(f, "attribute document must be a JSON object"),
        }
    }
}

impl Error for DocumentError {}
