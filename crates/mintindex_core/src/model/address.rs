//! Address-like identifiers shared by every registry entity.
//!
//! # Invariants
//! - Stored form is always `0x` + 40 lowercase hex chars.
//! - Parsing accepts mixed-case input and normalizes it.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static ADDRESS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0x[0-9a-f]{40}$").expect("valid address regex"));

/// Contract or account address in canonical lowercase hex form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Parses and normalizes an address string.
    pub fn parse(value: &str) -> Result<Self, AddressError> {
        let normalized = value.trim().to_ascii_lowercase();
        if !ADDRESS_RE.is_match(normalized.as_str()) {
            return Err(AddressError::Invalid(value.to_string()));
        }
        Ok(Self(normalized))
    }

    /// Builds an address from raw 20-byte form.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(format!("0x{}", hex::encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value.as_str())
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.0
    }
}

/// Address parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    Invalid(String),
}

impl Display for AddressError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(value) => write!(f, "invalid address: `{value}`"),
        }
    }
}

impl Error for AddressError {}
