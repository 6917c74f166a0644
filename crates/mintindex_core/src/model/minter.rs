//! Minter registry entity.
//!
//! # Invariants
//! - `id` is the minter contract address.
//! - `extra_minter_details` always holds attribute-document text (possibly `{}`).

use crate::model::address::Address;
use crate::model::document::AttributeDocument;

/// Column/field name of the minter-level attribute document.
pub const EXTRA_MINTER_DETAILS: &str = "extra_minter_details";

/// Pricing family derived from the on-chain minter type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinterKind {
    FixedPrice,
    LinearAuction,
    ExponentialAuction,
    Other,
}

impl MinterKind {
    /// Classifies a minter type tag such as `MinterDAExpV4`.
    pub fn classify(minter_type: &str) -> Self {
        if minter_type.contains("DAExp") {
            Self::ExponentialAuction
        } else if minter_type.contains("DALin") {
            Self::LinearAuction
        } else if minter_type.contains("SetPrice") {
            Self::FixedPrice
        } else {
            Self::Other
        }
    }
}

/// Pricing mechanism contract bindable to projects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Minter {
    pub id: Address,
    /// On-chain type tag, e.g. `MinterSetPriceV4`.
    pub minter_type: String,
    /// Filter (or core registry) that owns this minter.
    pub filter: Address,
    pub is_globally_allowlisted: bool,
    /// Serialized [`AttributeDocument`].
    pub extra_minter_details: String,
    pub updated_at: i64,
}

impl Minter {
    pub fn new(id: Address, minter_type: impl Into<String>, filter: Address, timestamp: i64) -> Self {
        Self {
            id,
            minter_type: minter_type.into(),
            filter,
            is_globally_allowlisted: false,
            extra_minter_details: AttributeDocument::new().serialize(),
            updated_at: timestamp,
        }
    }

    pub fn kind(&self) -> MinterKind {
        MinterKind::classify(self.minter_type.as_str())
    }

    pub fn details(&self) -> AttributeDocument {
        AttributeDocument::deserialize(self.extra_minter_details.as_str())
    }
}
