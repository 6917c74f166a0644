//! Per-(minter, project) join record.
//!
//! # Responsibility
//! - Carry typed price fields plus an extensible attribute document.
//! - Keep legacy typed auction fields for readers that predate the document.
//!
//! # Invariants
//! - `id` is derived from `(minter, project)`; one record per pair.
//! - `extra_minter_details` always holds attribute-document text.

use crate::model::address::Address;
use crate::model::document::AttributeDocument;
use crate::model::project::ProjectId;
use num_bigint::BigInt;
use std::fmt::{Display, Formatter};

/// Default currency for newly created join records.
pub const DEFAULT_CURRENCY_SYMBOL: &str = "ETH";

/// Document key for the auction start timestamp.
pub const START_TIME_KEY: &str = "startTime";
/// Document key for the linear auction end timestamp.
pub const END_TIME_KEY: &str = "endTime";
/// Document key for the auction start price.
pub const START_PRICE_KEY: &str = "startPrice";
/// Document key for the exponential auction half-life.
pub const HALF_LIFE_SECONDS_KEY: &str = "halfLifeSeconds";
/// Document key for the estimated time an exponential auction hits base price.
pub const APPROXIMATE_EXP_END_TIME_KEY: &str = "approximateDAExpEndTime";

/// Auction keys cleared together on auction reset.
pub const AUCTION_KEYS: &[&str] = &[
    START_TIME_KEY,
    END_TIME_KEY,
    START_PRICE_KEY,
    HALF_LIFE_SECONDS_KEY,
    APPROXIMATE_EXP_END_TIME_KEY,
];

/// Stable join-record identifier: `<minter>-<core>-<project number>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConfigId(String);

impl ConfigId {
    pub fn for_pair(minter: &Address, project: &ProjectId) -> Self {
        Self(format!("{minter}-{project}"))
    }

    /// Wraps an id read back from storage.
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for ConfigId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Configuration payload binding one minter to one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectMinterConfiguration {
    pub id: ConfigId,
    pub minter: Address,
    pub project: ProjectId,
    pub base_price: Option<BigInt>,
    pub price_is_configured: bool,
    pub currency_symbol: String,
    pub currency_address: Address,
    pub purchase_enabled: bool,
    /// Legacy typed auction fields; mirrored in the attribute document.
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub start_price: Option<BigInt>,
    pub half_life_seconds: Option<i64>,
    pub approximate_exp_end_time: Option<i64>,
    /// Serialized [`AttributeDocument`].
    pub extra_minter_details: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ProjectMinterConfiguration {
    /// Creates an unconfigured join record for `(minter, project)`.
    pub fn new(minter: Address, project: ProjectId, timestamp: i64) -> Self {
        Self {
            id: ConfigId::for_pair(&minter, &project),
            minter,
            project,
            base_price: None,
            price_is_configured: false,
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
            currency_address: Address::from_bytes([0u8; 20]),
            purchase_enabled: true,
            start_time: None,
            end_time: None,
            start_price: None,
            half_life_seconds: None,
            approximate_exp_end_time: None,
            extra_minter_details: AttributeDocument::new().serialize(),
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    pub fn details(&self) -> AttributeDocument {
        AttributeDocument::deserialize(self.extra_minter_details.as_str())
    }

    /// Clears typed auction fields and their document mirrors.
    pub fn clear_auction(&mut self) {
        self.start_time = None;
        self.end_time = None;
        self.start_price = None;
        self.half_life_seconds = None;
        self.approximate_exp_end_time = None;
        let details = AUCTION_KEYS
            .iter()
            .fold(self.details(), |doc, key| doc.with_entry_removed(key));
        self.extra_minter_details = details.serialize();
    }
}
