//! Typed configuration-value payloads and their document operations.
//!
//! One change type covers every payload kind; the kind only matters when the
//! value is converted into a [`DocValue`].

use crate::model::address::Address;
use crate::model::document::{AttributeDocument, DocValue};
use crate::model::minter::EXTRA_MINTER_DETAILS;
use crate::repo::RegistryStore;
use crate::service::attribute_store::{
    AttributeStoreAdapter, AttributeStoreResult, DocumentOwner,
};
use num_bigint::BigInt;

/// Payload of a configuration-value event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    Bool(bool),
    Int(BigInt),
    Address(Address),
    Bytes(Vec<u8>),
}

impl From<ConfigValue> for DocValue {
    fn from(value: ConfigValue) -> Self {
        match value {
            ConfigValue::Bool(flag) => DocValue::Bool(flag),
            ConfigValue::Int(number) => DocValue::Int(number),
            ConfigValue::Address(address) => DocValue::Address(address),
            ConfigValue::Bytes(bytes) => DocValue::Bytes(bytes),
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<BigInt> for ConfigValue {
    fn from(value: BigInt) -> Self {
        Self::Int(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        Self::Int(BigInt::from(value))
    }
}

impl From<Address> for ConfigValue {
    fn from(value: Address) -> Self {
        Self::Address(value)
    }
}

impl From<Vec<u8>> for ConfigValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

/// Record a configuration change applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigScope {
    /// The minter's own document.
    Minter,
    /// The join record of the minter and one project.
    Project {
        core_contract: Address,
        project_number: BigInt,
    },
}

/// One configuration-document change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigChange {
    Set { key: String, value: ConfigValue },
    RemoveKey { key: String },
    AddToSet { key: String, value: ConfigValue },
    RemoveFromSet { key: String, value: ConfigValue },
}

impl ConfigChange {
    pub fn set(key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        Self::Set {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn remove_key(key: impl Into<String>) -> Self {
        Self::RemoveKey { key: key.into() }
    }

    pub fn add_to_set(key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        Self::AddToSet {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn remove_from_set(key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        Self::RemoveFromSet {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Self::Set { key, .. }
            | Self::RemoveKey { key }
            | Self::AddToSet { key, .. }
            | Self::RemoveFromSet { key, .. } => key.as_str(),
        }
    }

    /// Short label used in diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Set { .. } => "set",
            Self::RemoveKey { .. } => "remove_key",
            Self::AddToSet { .. } => "add_to_set",
            Self::RemoveFromSet { .. } => "remove_from_set",
        }
    }

    /// Applies the change to `record`'s extra-minter-details document and persists it.
    pub fn apply_to<S, R>(
        &self,
        adapter: &AttributeStoreAdapter<'_, S>,
        record: &mut R,
        timestamp: i64,
    ) -> AttributeStoreResult<AttributeDocument>
    where
        S: RegistryStore + ?Sized,
        R: DocumentOwner,
    {
        let field = EXTRA_MINTER_DETAILS;
        match self {
            Self::Set { key, value } => {
                adapter.set_value(record, field, key, value.clone().into(), timestamp)
            }
            Self::RemoveKey { key } => adapter.remove_entry(record, field, key, timestamp),
            Self::AddToSet { key, value } => {
                adapter.add_array_value(record, field, key, value.clone().into(), timestamp)
            }
            Self::RemoveFromSet { key, value } => {
                let value = DocValue::from(value.clone());
                adapter.remove_array_value(record, field, key, &value, timestamp)
            }
        }
    }
}
