//! Load-mutate-persist helpers binding attribute documents to records.
//!
//! # Responsibility
//! - Read a record's document field, apply one document transform, write the
//!   serialized result back and persist the whole record.
//! - Treat minter and join-record documents the same way.
//!
//! # Invariants
//! - Malformed stored text is replaced by an empty document, with a warning.
//! - The owning record's timestamp is bumped on every write.

use crate::model::configuration::ProjectMinterConfiguration;
use crate::model::document::{AttributeDocument, DocValue};
use crate::model::minter::{Minter, EXTRA_MINTER_DETAILS};
use crate::repo::{RegistryStore, RepoError, RepoResult};
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Record that owns one or more attribute-document text fields.
pub trait DocumentOwner {
    /// Identifier used in diagnostics.
    fn owner_id(&self) -> String;
    /// Current text of `field`, or `None` when the record has no such field.
    fn document_text(&self, field: &str) -> Option<&str>;
    /// Replaces the text of `field`. Returns `false` for unknown fields.
    fn replace_document_text(&mut self, field: &str, text: String) -> bool;
    fn touch(&mut self, timestamp: i64);
    fn save<S: RegistryStore + ?Sized>(&self, store: &S) -> RepoResult<()>;
}

impl DocumentOwner for Minter {
    fn owner_id(&self) -> String {
        self.id.to_string()
    }

    fn document_text(&self, field: &str) -> Option<&str> {
        (field == EXTRA_MINTER_DETAILS).then_some(self.extra_minter_details.as_str())
    }

    fn replace_document_text(&mut self, field: &str, text: String) -> bool {
        if field != EXTRA_MINTER_DETAILS {
            return false;
        }
        self.extra_minter_details = text;
        true
    }

    fn touch(&mut self, timestamp: i64) {
        self.updated_at = timestamp;
    }

    fn save<S: RegistryStore + ?Sized>(&self, store: &S) -> RepoResult<()> {
        store.put_minter(self)
    }
}

impl DocumentOwner for ProjectMinterConfiguration {
    fn owner_id(&self) -> String {
        self.id.to_string()
    }

    fn document_text(&self, field: &str) -> Option<&str> {
        (field == EXTRA_MINTER_DETAILS).then_some(self.extra_minter_details.as_str())
    }

    fn replace_document_text(&mut self, field: &str, text: String) -> bool {
        if field != EXTRA_MINTER_DETAILS {
            return false;
        }
        self.extra_minter_details = text;
        true
    }

    fn touch(&mut self, timestamp: i64) {
        self.updated_at = timestamp;
    }

    fn save<S: RegistryStore + ?Sized>(&self, store: &S) -> RepoResult<()> {
        store.put_configuration(self)
    }
}

/// Attribute store errors.
#[derive(Debug)]
pub enum AttributeStoreError {
    UnknownField { owner: String, field: String },
    Repo(RepoError),
}

impl Display for AttributeStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownField { owner, field } => {
                write!(f, "record {owner} has no document field `{field}`")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AttributeStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::UnknownField { .. } => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for AttributeStoreError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub type AttributeStoreResult<T> = Result<T, AttributeStoreError>;

/// Document operations persisted through a [`RegistryStore`].
pub struct AttributeStoreAdapter<'s, S: ?Sized> {
    store: &'s S,
}

impl<'s, S: RegistryStore + ?Sized> AttributeStoreAdapter<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Decodes the document held in `field`, degrading malformed text to empty.
    pub fn load<R: DocumentOwner>(
        &self,
        record: &R,
        field: &str,
    ) -> AttributeStoreResult<AttributeDocument> {
        let text = record
            .document_text(field)
            .ok_or_else(|| unknown_field(record, field))?;
        match AttributeDocument::try_deserialize(text) {
            Ok(document) => Ok(document),
            Err(err) => {
                warn!(
                    "event=attribute_load module=attribute_store status=error error_code=malformed_document owner={} field={} error={}",
                    record.owner_id(),
                    field,
                    err
                );
                Ok(AttributeDocument::new())
            }
        }
    }

    pub fn set_value<R: DocumentOwner>(
        &self,
        record: &mut R,
        field: &str,
        key: &str,
        value: DocValue,
        timestamp: i64,
    ) -> AttributeStoreResult<AttributeDocument> {
        self.apply(record, field, timestamp, |doc| doc.with_entry_set(key, value))
    }

    pub fn remove_entry<R: DocumentOwner>(
        &self,
        record: &mut R,
        field: &str,
        key: &str,
        timestamp: i64,
    ) -> AttributeStoreResult<AttributeDocument> {
        self.apply(record, field, timestamp, |doc| doc.with_entry_removed(key))
    }

    pub fn add_array_value<R: DocumentOwner>(
        &self,
        record: &mut R,
        field: &str,
        key: &str,
        value: DocValue,
        timestamp: i64,
    ) -> AttributeStoreResult<AttributeDocument> {
        self.apply(record, field, timestamp, |doc| {
            doc.with_array_value_added(key, value)
        })
    }

    pub fn remove_array_value<R: DocumentOwner>(
        &self,
        record: &mut R,
        field: &str,
        key: &str,
        value: &DocValue,
        timestamp: i64,
    ) -> AttributeStoreResult<AttributeDocument> {
        self.apply(record, field, timestamp, |doc| {
            doc.with_array_value_removed(key, value)
        })
    }

    pub fn merge_document<R: DocumentOwner>(
        &self,
        record: &mut R,
        field: &str,
        other: &AttributeDocument,
        timestamp: i64,
    ) -> AttributeStoreResult<AttributeDocument> {
        self.apply(record, field, timestamp, |doc| doc.merged_with(other))
    }

    fn apply<R: DocumentOwner>(
        &self,
        record: &mut R,
        field: &str,
        timestamp: i64,
        transform: impl FnOnce(&AttributeDocument) -> AttributeDocument,
    ) -> AttributeStoreResult<AttributeDocument> {
        let current = self.load(record, field)?;
        let next = transform(&current);
        if !record.replace_document_text(field, next.serialize()) {
            return Err(unknown_field(record, field));
        }
        record.touch(timestamp);
        record.save(self.store)?;
        Ok(next)
    }
}

fn unknown_field<R: DocumentOwner>(record: &R, field: &str) -> AttributeStoreError {
    AttributeStoreError::UnknownField {
        owner: record.owner_id(),
        field: field.to_string(),
    }
}
