//! Project and core-contract registry entities.
//!
//! Projects are owned by the external project registry; the core only reads
//! them and moves the `active_config` pointer.

use crate::model::address::Address;
use crate::model::configuration::ConfigId;
use num_bigint::BigInt;
use std::fmt::{Display, Formatter};

/// Project identity: `(core contract, project number)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProjectId {
    pub core_contract: Address,
    pub project_number: BigInt,
}

impl ProjectId {
    pub fn new(core_contract: Address, project_number: impl Into<BigInt>) -> Self {
        Self {
            core_contract,
            project_number: project_number.into(),
        }
    }
}

impl Display for ProjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.core_contract, self.project_number)
    }
}

/// Sellable project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: ProjectId,
    /// Join record currently governing sales, if any.
    pub active_config: Option<ConfigId>,
    /// Registry-maintained price snapshot. Read-only for this crate.
    pub current_price_snapshot: Option<BigInt>,
    pub updated_at: i64,
}

impl Project {
    pub fn new(id: ProjectId, timestamp: i64) -> Self {
        Self {
            id,
            active_config: None,
            current_price_snapshot: None,
            updated_at: timestamp,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.active_config.is_some()
    }
}

/// Core contract record tracking which filter is canonical for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreContract {
    pub id: Address,
    pub canonical_filter: Option<Address>,
    pub updated_at: i64,
}

impl CoreContract {
    pub fn new(id: Address, timestamp: i64) -> Self {
        Self {
            id,
            canonical_filter: None,
            updated_at: timestamp,
        }
    }
}
