//! Observed-event dispatch.
//!
//! # Responsibility
//! - Map one decoded minter/filter event onto resolver operations.
//! - Choose the unlink policy from the owning filter's generation.
//!
//! # Invariants
//! - `process` never returns an error; failures become `EventOutcome::Skipped`
//!   with a logged diagnostic.

use crate::chain::ChainState;
use crate::model::address::Address;
use crate::model::filter::{AllowlistScope, FilterGeneration};
use crate::model::minter::Minter;
use crate::repo::lookup::{ProjectRef, ProjectRegistry};
use crate::repo::RegistryStore;
use crate::service::config_values::{ConfigChange, ConfigScope};
use crate::service::resolver::{
    BindingKey, ConfigurationResolver, ResolverError, ResolverResult, UnlinkPolicy,
};
use log::{info, warn};
use num_bigint::BigInt;

/// Minter and project an event refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectTarget {
    pub minter: Address,
    pub core_contract: Address,
    pub project: ProjectRef,
}

impl ProjectTarget {
    pub fn new(minter: Address, core_contract: Address, project: ProjectRef) -> Self {
        Self {
            minter,
            core_contract,
            project,
        }
    }
}

/// Decoded minter-side event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MinterEvent {
    FilterDeployed {
        filter: Address,
        generation: FilterGeneration,
        core_registry: Option<Address>,
    },
    MinterApproved {
        filter: Address,
        minter: Address,
        scope: AllowlistScope,
    },
    MinterRevoked {
        filter: Address,
        minter: Address,
        scope: AllowlistScope,
    },
    ProjectMinterRegistered(ProjectTarget),
    ProjectMinterRemoved(ProjectTarget),
    FilterCanonicalized {
        filter: Address,
        core_contract: Address,
    },
    MinterConfigChanged {
        minter: Address,
        change: ConfigChange,
    },
    ProjectConfigChanged {
        target: ProjectTarget,
        change: ConfigChange,
    },
    PriceUpdated {
        target: ProjectTarget,
        price: BigInt,
    },
    /// Price changed without a payload; re-read it from the minter.
    PriceInfoChanged(ProjectTarget),
    CurrencyUpdated {
        target: ProjectTarget,
        symbol: String,
        currency_address: Address,
    },
    PurchaseToggled {
        target: ProjectTarget,
        enabled: bool,
    },
    LinearAuctionSet {
        target: ProjectTarget,
        start_time: i64,
        end_time: i64,
        start_price: BigInt,
        base_price: BigInt,
    },
    ExponentialAuctionSet {
        target: ProjectTarget,
        start_time: i64,
        half_life_seconds: i64,
        start_price: BigInt,
        base_price: BigInt,
    },
    /// Auction changed without a payload; re-read it from the minter.
    AuctionInfoChanged(ProjectTarget),
    AuctionReset(ProjectTarget),
}

impl MinterEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::FilterDeployed { .. } => "filter_deployed",
            Self::MinterApproved { .. } => "minter_approved",
            Self::MinterRevoked { .. } => "minter_revoked",
            Self::ProjectMinterRegistered(_) => "project_minter_registered",
            Self::ProjectMinterRemoved(_) => "project_minter_removed",
            Self::FilterCanonicalized { .. } => "filter_canonicalized",
            Self::MinterConfigChanged { .. } => "minter_config_changed",
            Self::ProjectConfigChanged { .. } => "project_config_changed",
            Self::PriceUpdated { .. } => "price_updated",
            Self::PriceInfoChanged(_) => "price_info_changed",
            Self::CurrencyUpdated { .. } => "currency_updated",
            Self::PurchaseToggled { .. } => "purchase_toggled",
            Self::LinearAuctionSet { .. } => "linear_auction_set",
            Self::ExponentialAuctionSet { .. } => "exponential_auction_set",
            Self::AuctionInfoChanged(_) => "auction_info_changed",
            Self::AuctionReset(_) => "auction_reset",
        }
    }
}

/// Result of processing one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Applied,
    Skipped {
        error_code: &'static str,
        reason: String,
    },
}

impl EventOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Entry point for the event-ingestion layer.
pub struct EventProcessor<S: RegistryStore, C: ChainState> {
    resolver: ConfigurationResolver<S, C>,
}

impl<S: RegistryStore, C: ChainState> EventProcessor<S, C> {
    pub fn new(resolver: ConfigurationResolver<S, C>) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &ConfigurationResolver<S, C> {
        &self.resolver
    }

    /// Applies one event observed at `timestamp`.
    pub fn process(&self, event: &MinterEvent, timestamp: i64) -> EventOutcome {
        match self.dispatch(event, timestamp) {
            Ok(()) => {
                info!(
                    "event=minter_event module=processor status=ok kind={} timestamp={}",
                    event.name(),
                    timestamp
                );
                EventOutcome::Applied
            }
            Err(err) => {
                warn!(
                    "event=minter_event module=processor status=skip kind={} timestamp={} error_code={} error={}",
                    event.name(),
                    timestamp,
                    err.error_code(),
                    err
                );
                EventOutcome::Skipped {
                    error_code: err.error_code(),
                    reason: err.to_string(),
                }
            }
        }
    }

    fn dispatch(&self, event: &MinterEvent, timestamp: i64) -> ResolverResult<()> {
        let resolver = &self.resolver;
        match event {
            MinterEvent::FilterDeployed {
                filter,
                generation,
                core_registry,
            } => {
                resolver.ensure_filter(filter, *generation, core_registry.as_ref(), timestamp)?;
            }
            MinterEvent::MinterApproved {
                filter,
                minter,
                scope,
            } => {
                self.try_onboard_minter(minter, timestamp)?;
                resolver.set_allowed(filter, minter, scope, true, timestamp)?;
            }
            MinterEvent::MinterRevoked {
                filter,
                minter,
                scope,
            } => {
                resolver.set_allowed(filter, minter, scope, false, timestamp)?;
            }
            MinterEvent::ProjectMinterRegistered(target) => {
                let project_number = self.project_number(target);
                let mut project = resolver.find_project(&target.core_contract, &project_number)?;
                let minter = self.known_or_synced_minter(&target.minter, timestamp)?;
                resolver.register_binding(&mut project, &minter, timestamp)?;
            }
            MinterEvent::ProjectMinterRemoved(target) => {
                let Some(minter) = resolver.store().get_minter(&target.minter)? else {
                    return Err(ResolverError::MinterNotFound(target.minter.clone()));
                };
                let project_number = self.project_number(target);
                let mut project = resolver.find_project(&target.core_contract, &project_number)?;
                let policy = self.unlink_policy(&minter)?;
                resolver.remove_binding_with(&mut project, &minter, timestamp, policy)?;
            }
            MinterEvent::FilterCanonicalized {
                filter,
                core_contract,
            } => {
                resolver.canonicalize_filter(filter, core_contract, timestamp)?;
            }
            MinterEvent::MinterConfigChanged { minter, change } => {
                resolver.apply_config_change(minter, &ConfigScope::Minter, change, timestamp)?;
            }
            MinterEvent::ProjectConfigChanged { target, change } => {
                let scope = ConfigScope::Project {
                    core_contract: target.core_contract.clone(),
                    project_number: self.project_number(target),
                };
                resolver.apply_config_change(&target.minter, &scope, change, timestamp)?;
            }
            MinterEvent::PriceUpdated { target, price } => {
                resolver.set_base_price(&self.binding_key(target), price.clone(), timestamp)?;
            }
            MinterEvent::PriceInfoChanged(target) => {
                resolver.refresh_price_from_chain(&self.binding_key(target), timestamp)?;
            }
            MinterEvent::CurrencyUpdated {
                target,
                symbol,
                currency_address,
            } => {
                resolver.set_currency(
                    &self.binding_key(target),
                    symbol,
                    currency_address.clone(),
                    timestamp,
                )?;
            }
            MinterEvent::PurchaseToggled { target, enabled } => {
                resolver.set_purchase_enabled(&self.binding_key(target), *enabled, timestamp)?;
            }
            MinterEvent::LinearAuctionSet {
                target,
                start_time,
                end_time,
                start_price,
                base_price,
            } => {
                resolver.set_linear_auction(
                    &self.binding_key(target),
                    *start_time,
                    *end_time,
                    start_price.clone(),
                    base_price.clone(),
                    timestamp,
                )?;
            }
            MinterEvent::ExponentialAuctionSet {
                target,
                start_time,
                half_life_seconds,
                start_price,
                base_price,
            } => {
                resolver.set_exponential_auction(
                    &self.binding_key(target),
                    *start_time,
                    *half_life_seconds,
                    start_price.clone(),
                    base_price.clone(),
                    timestamp,
                )?;
            }
            MinterEvent::AuctionInfoChanged(target) => {
                resolver.refresh_auction_from_chain(&self.binding_key(target), timestamp)?;
            }
            MinterEvent::AuctionReset(target) => {
                resolver.reset_auction(&self.binding_key(target), timestamp)?;
            }
        }
        Ok(())
    }

    fn project_number(&self, target: &ProjectTarget) -> BigInt {
        self.resolver.store().resolve_project_number(&target.project)
    }

    fn binding_key(&self, target: &ProjectTarget) -> BindingKey {
        BindingKey::new(
            target.minter.clone(),
            target.core_contract.clone(),
            self.project_number(target),
        )
    }

    fn known_or_synced_minter(&self, minter_id: &Address, timestamp: i64) -> ResolverResult<Minter> {
        match self.resolver.store().get_minter(minter_id)? {
            Some(minter) => Ok(minter),
            None => self.resolver.sync_minter(minter_id, timestamp),
        }
    }

    /// Indexes an unknown minter; a reverted read only skips the minter record.
    fn try_onboard_minter(&self, minter_id: &Address, timestamp: i64) -> ResolverResult<()> {
        match self.known_or_synced_minter(minter_id, timestamp) {
            Ok(_) => Ok(()),
            Err(ResolverError::ExternalCallReverted(err)) => {
                warn!(
                    "event=minter_onboard module=processor status=skip error_code=external_call_reverted minter_id={} error={}",
                    minter_id, err
                );
                Ok(())
            }
            Err(other) => Err(other),
        }
    }

    fn unlink_policy(&self, minter: &Minter) -> ResolverResult<UnlinkPolicy> {
        Ok(match self.resolver.store().get_filter(&minter.filter)? {
            Some(filter) => UnlinkPolicy::for_generation(filter.generation),
            None => UnlinkPolicy::from_retain(self.resolver.config().retain_on_unlink),
        })
    }
}
