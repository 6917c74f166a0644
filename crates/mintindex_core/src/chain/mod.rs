//! Authoritative chain-state reads.
//!
//! # Responsibility
//! - Define the point-in-time calls the resolver makes against deployed
//!   minters and filters.
//!
//! # Invariants
//! - Every call may revert; callers must read before they write so a revert
//!   never leaves a partially updated record behind.

use crate::model::address::Address;
use num_bigint::BigInt;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ChainResult<T> = Result<T, ChainCallError>;

/// A reverted or otherwise failed chain read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainCallError {
    /// Contract function that was called, e.g. `minterType`.
    pub call: &'static str,
    pub target: Address,
    pub reason: String,
}

impl ChainCallError {
    pub fn reverted(call: &'static str, target: &Address, reason: impl Into<String>) -> Self {
        Self {
            call,
            target: target.clone(),
            reason: reason.into(),
        }
    }
}

impl Display for ChainCallError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "call `{}` on {} reverted: {}",
            self.call, self.target, self.reason
        )
    }
}

impl Error for ChainCallError {}

/// Price information reported by a minter for one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceInfo {
    pub is_configured: bool,
    pub token_price: BigInt,
    pub currency_symbol: String,
    pub currency_address: Address,
}

/// Auction parameters reported by a Dutch-auction minter for one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuctionParameters {
    Unset,
    Linear {
        start_time: i64,
        end_time: i64,
        start_price: BigInt,
        base_price: BigInt,
    },
    Exponential {
        start_time: i64,
        half_life_seconds: i64,
        start_price: BigInt,
        base_price: BigInt,
    },
}

/// Chain-state collaborator.
pub trait ChainState {
    /// On-chain type tag of a minter, e.g. `MinterDAExpV4`.
    fn minter_type(&self, minter: &Address) -> ChainResult<String>;

    /// Filter (or core registry) the minter reports as its owner.
    fn minter_filter(&self, minter: &Address) -> ChainResult<Address>;

    fn price_info(
        &self,
        minter: &Address,
        core_contract: &Address,
        project_number: &BigInt,
    ) -> ChainResult<PriceInfo>;

    fn auction_parameters(
        &self,
        minter: &Address,
        core_contract: &Address,
        project_number: &BigInt,
    ) -> ChainResult<AuctionParameters>;

    /// `(project number, minter)` pairs registered on `filter` for `core_contract`.
    fn registered_project_minters(
        &self,
        filter: &Address,
        core_contract: &Address,
    ) -> ChainResult<Vec<(BigInt, Address)>>;
}
