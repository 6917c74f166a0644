//! Minter filter / core registry entity and allow-list rules.
//!
//! # Invariants
//! - Allow-lists keep insertion order and never contain duplicates.
//! - Empty contract-specific lists are dropped.

use crate::model::address::Address;
use std::collections::BTreeMap;

/// Protocol generation of a filter.
///
/// Legacy filters serve one core contract and delete join records on unlink;
/// shared filters are registry-backed and detach them instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterGeneration {
    Legacy,
    Shared,
}

impl FilterGeneration {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::Shared => "shared",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "legacy" => Some(Self::Legacy),
            "shared" => Some(Self::Shared),
            _ => None,
        }
    }
}

/// Allow-list a membership change applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowlistScope {
    Global,
    Contract(Address),
}

/// Routing/authorization layer grouping minters under core contracts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinterFilter {
    pub id: Address,
    pub generation: FilterGeneration,
    /// Core registry backing a shared filter.
    pub core_registry: Option<Address>,
    pub global_allowlist: Vec<Address>,
    pub contract_allowlists: BTreeMap<Address, Vec<Address>>,
    pub updated_at: i64,
}

impl MinterFilter {
    pub fn new(id: Address, generation: FilterGeneration, timestamp: i64) -> Self {
        Self {
            id,
            generation,
            core_registry: None,
            global_allowlist: Vec::new(),
            contract_allowlists: BTreeMap::new(),
            updated_at: timestamp,
        }
    }

    /// Whether `minter` may serve projects on `core_contract`.
    pub fn is_allowed(&self, minter: &Address, core_contract: &Address) -> bool {
        self.global_allowlist.contains(minter)
            || self
                .contract_allowlists
                .get(core_contract)
                .is_some_and(|list| list.contains(minter))
    }

    /// Adds or removes `minter` in the given scope.
    ///
    /// Returns `true` when membership actually changed.
    pub fn set_allowed(&mut self, minter: &Address, scope: &AllowlistScope, allowed: bool) -> bool {
        match scope {
            AllowlistScope::Global => set_membership(&mut self.global_allowlist, minter, allowed),
            AllowlistScope::Contract(contract) => {
                let list = self.contract_allowlists.entry(contract.clone()).or_default();
                let changed = set_membership(list, minter, allowed);
                if list.is_empty() {
                    self.contract_allowlists.remove(contract);
                }
                changed
            }
        }
    }
}

fn set_membership(list: &mut Vec<Address>, minter: &Address, allowed: bool) -> bool {
    let present = list.contains(minter);
    match (allowed, present) {
        (true, false) => {
            list.push(minter.clone());
            true
        }
        (false, true) => {
            list.retain(|existing| existing != minter);
            true
        }
        _ => false,
    }
}
