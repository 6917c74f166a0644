//! Project/minter configuration resolver.
//!
//! # Responsibility
//! - Own the per-project state machine `Unconfigured -> Active(config)`.
//! - Create, activate, detach and delete project/minter join records.
//! - Apply price, currency and auction updates to join records.
//!
//! # Invariants
//! - Only a minter whose filter is canonical for the core contract can be
//!   the active configuration of a project.
//! - Chain reads happen before any write of the same operation.
//! - A dangling or foreign active pointer is cleared before it is relied upon.
//! - Projects are never created here.

use crate::auction::{
    exponential_duration_to_base_price, exponential_price, linear_price, AuctionMathError,
};
use crate::chain::{AuctionParameters, ChainCallError, ChainState};
use crate::model::address::Address;
use crate::model::configuration::{
    ConfigId, ProjectMinterConfiguration, APPROXIMATE_EXP_END_TIME_KEY, END_TIME_KEY,
    HALF_LIFE_SECONDS_KEY, START_PRICE_KEY, START_TIME_KEY,
};
use crate::model::document::{AttributeDocument, DocValue};
use crate::model::filter::{AllowlistScope, FilterGeneration, MinterFilter};
use crate::model::minter::{Minter, MinterKind};
use crate::model::project::{CoreContract, Project, ProjectId};
use crate::repo::lookup::{active_binding, find_binding, ProjectRegistry};
use crate::repo::{RegistryStore, RepoError};
use crate::service::attribute_store::{AttributeStoreAdapter, AttributeStoreError};
use crate::service::config_values::{ConfigChange, ConfigScope};
use log::{debug, info, warn};
use num_bigint::BigInt;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Resolver settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Keep join records reachable after they stop being active.
    pub retain_on_unlink: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            retain_on_unlink: true,
        }
    }
}

/// What happens to a join record when its binding is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlinkPolicy {
    Delete,
    /// Keep the record; re-registration reuses its price and config data.
    Detach,
}

impl UnlinkPolicy {
    pub fn from_retain(retain_on_unlink: bool) -> Self {
        if retain_on_unlink {
            Self::Detach
        } else {
            Self::Delete
        }
    }

    pub fn for_generation(generation: FilterGeneration) -> Self {
        match generation {
            FilterGeneration::Legacy => Self::Delete,
            FilterGeneration::Shared => Self::Detach,
        }
    }
}

/// Resolver error.
#[derive(Debug)]
pub enum ResolverError {
    ProjectNotFound(ProjectId),
    MinterNotFound(Address),
    FilterNotFound(Address),
    /// A chain read reverted; no derived write happened.
    ExternalCallReverted(ChainCallError),
    InvalidAuction(AuctionMathError),
    AttributeStore(AttributeStoreError),
    Repo(RepoError),
}

impl ResolverError {
    /// Stable code used in diagnostics.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ProjectNotFound(_) => "project_not_found",
            Self::MinterNotFound(_) => "minter_not_found",
            Self::FilterNotFound(_) => "filter_not_found",
            Self::ExternalCallReverted(_) => "external_call_reverted",
            Self::InvalidAuction(_) => "invalid_auction",
            Self::AttributeStore(_) => "attribute_store",
            Self::Repo(_) => "repo",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ProjectNotFound(_) | Self::MinterNotFound(_) | Self::FilterNotFound(_)
        )
    }
}

impl Display for ResolverError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::MinterNotFound(id) => write!(f, "minter not found: {id}"),
            Self::FilterNotFound(id) => write!(f, "minter filter not found: {id}"),
            Self::ExternalCallReverted(err) => write!(f, "{err}"),
            Self::InvalidAuction(err) => write!(f, "invalid auction parameters: {err}"),
            Self::AttributeStore(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ResolverError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ExternalCallReverted(err) => Some(err),
            Self::InvalidAuction(err) => Some(err),
            Self::AttributeStore(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ResolverError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<AttributeStoreError> for ResolverError {
    fn from(value: AttributeStoreError) -> Self {
        match value {
            AttributeStoreError::Repo(err) => Self::Repo(err),
            other => Self::AttributeStore(other),
        }
    }
}

impl From<AuctionMathError> for ResolverError {
    fn from(value: AuctionMathError) -> Self {
        Self::InvalidAuction(value)
    }
}

pub type ResolverResult<T> = Result<T, ResolverError>;

/// Addresses one project/minter join record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingKey {
    pub minter: Address,
    pub core_contract: Address,
    pub project_number: BigInt,
}

impl BindingKey {
    pub fn new(minter: Address, core_contract: Address, project_number: impl Into<BigInt>) -> Self {
        Self {
            minter,
            core_contract,
            project_number: project_number.into(),
        }
    }

    pub fn project_id(&self) -> ProjectId {
        ProjectId::new(self.core_contract.clone(), self.project_number.clone())
    }

    pub fn config_id(&self) -> ConfigId {
        ConfigId::for_pair(&self.minter, &self.project_id())
    }
}

/// Project, minter and join record resolved together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub project: Project,
    pub minter: Minter,
    /// Loaded from storage, or freshly built and not yet persisted.
    pub configuration: ProjectMinterConfiguration,
}

impl Binding {
    pub fn is_active(&self) -> bool {
        self.project.active_config.as_ref() == Some(&self.configuration.id)
    }
}

/// Observable configuration state of one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectState {
    Unconfigured,
    Active(ConfigId),
}

/// Summary of one canonicalization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CanonicalizeReport {
    /// Projects whose active pointer was cleared.
    pub cleared: usize,
    /// Reported pairs that became active.
    pub activated: usize,
    /// Reported pairs whose project or minter is not indexed.
    pub skipped: usize,
}

/// Resolver over an injected registry store and chain-state reader.
pub struct ConfigurationResolver<S: RegistryStore, C: ChainState> {
    store: S,
    chain: C,
    config: ResolverConfig,
}

impl<S: RegistryStore, C: ChainState> ConfigurationResolver<S, C> {
    pub fn new(store: S, chain: C, config: ResolverConfig) -> Self {
        Self {
            store,
            chain,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn chain(&self) -> &C {
        &self.chain
    }

    pub fn config(&self) -> ResolverConfig {
        self.config
    }

    /// Loads a project through the project registry.
    ///
    /// # Contract
    /// - Unknown projects are `ProjectNotFound`; they are never created.
    pub fn find_project(
        &self,
        core_contract: &Address,
        project_number: &BigInt,
    ) -> ResolverResult<Project> {
        match self.store.lookup(core_contract, project_number)? {
            Some(project) => Ok(project),
            None => {
                let id = ProjectId::new(core_contract.clone(), project_number.clone());
                warn!(
                    "event=binding_resolve module=resolver status=error error_code=project_not_found project_id={}",
                    id
                );
                Err(ResolverError::ProjectNotFound(id))
            }
        }
    }

    fn require_minter(&self, minter_id: &Address) -> ResolverResult<Minter> {
        match self.store.get_minter(minter_id)? {
            Some(minter) => Ok(minter),
            None => {
                warn!(
                    "event=binding_resolve module=resolver status=error error_code=minter_not_found minter_id={}",
                    minter_id
                );
                Err(ResolverError::MinterNotFound(minter_id.clone()))
            }
        }
    }

    /// Resolves the project, the minter and their join record.
    ///
    /// # Contract
    /// - `ProjectNotFound` / `MinterNotFound` when either side is unknown.
    /// - A missing join record is built in memory and left unpersisted.
    pub fn resolve_or_create_binding(
        &self,
        minter_id: &Address,
        core_contract: &Address,
        project_number: &BigInt,
        timestamp: i64,
    ) -> ResolverResult<Binding> {
        let project = self.find_project(core_contract, project_number)?;
        let minter = self.require_minter(minter_id)?;
        let configuration = match find_binding(&self.store, minter_id, &project.id)? {
            Some(existing) => existing,
            None => ProjectMinterConfiguration::new(minter_id.clone(), project.id.clone(), timestamp),
        };
        Ok(Binding {
            project,
            minter,
            configuration,
        })
    }

    /// Every join record of a project, active or detached.
    pub fn bindings_for_project(
        &self,
        project_id: &ProjectId,
    ) -> ResolverResult<Vec<ProjectMinterConfiguration>> {
        Ok(self.store.list_configurations_for_project(project_id)?)
    }

    /// Reads the project's state without repairing it.
    pub fn project_state(&self, project_id: &ProjectId) -> ResolverResult<ProjectState> {
        let project = self
            .store
            .get_project(project_id)?
            .ok_or_else(|| ResolverError::ProjectNotFound(project_id.clone()))?;
        Ok(match self.active_configuration(&project)? {
            Some(configuration) => ProjectState::Active(configuration.id),
            None => ProjectState::Unconfigured,
        })
    }

    /// Join record the project's active pointer refers to, if it is valid.
    pub fn active_configuration(
        &self,
        project: &Project,
    ) -> ResolverResult<Option<ProjectMinterConfiguration>> {
        let active = active_binding(&self.store, project)?
            .filter(|configuration| configuration.project == project.id);
        if active.is_none() && project.active_config.is_some() {
            warn!(
                "event=active_pointer_check module=resolver status=error error_code=invariant_violation project_id={}",
                project.id
            );
        }
        Ok(active)
    }

    /// Registers `minter` for `project`, activating it when its filter is canonical.
    ///
    /// # Contract
    /// - Creates the join record if absent and reuses a detached one.
    /// - Activation overwrites any previous active pointer.
    /// - Converges under repeated calls with the same arguments.
    pub fn register_binding(
        &self,
        project: &mut Project,
        minter: &Minter,
        timestamp: i64,
    ) -> ResolverResult<ProjectMinterConfiguration> {
        self.repair_active_pointer(project, timestamp)?;
        let configuration = match find_binding(&self.store, &minter.id, &project.id)? {
            Some(existing) => existing,
            None => {
                let created =
                    ProjectMinterConfiguration::new(minter.id.clone(), project.id.clone(), timestamp);
                self.store.put_configuration(&created)?;
                created
            }
        };

        let activated = self.is_canonical(&minter.filter, &project.id.core_contract)?;
        if activated {
            project.active_config = Some(configuration.id.clone());
            project.updated_at = timestamp;
            self.store.put_project(project)?;
        }
        info!(
            "event=binding_register module=resolver status=ok config_id={} activated={}",
            configuration.id, activated
        );
        Ok(configuration)
    }

    /// Removes the binding using the resolver's default retention.
    pub fn remove_binding(
        &self,
        project: &mut Project,
        minter: &Minter,
        timestamp: i64,
    ) -> ResolverResult<bool> {
        let policy = UnlinkPolicy::from_retain(self.config.retain_on_unlink);
        self.remove_binding_with(project, minter, timestamp, policy)
    }

    /// Unlinks the binding if it is the project's active one.
    ///
    /// Returns `false` (and writes nothing) when the binding is not active.
    pub fn remove_binding_with(
        &self,
        project: &mut Project,
        minter: &Minter,
        timestamp: i64,
        policy: UnlinkPolicy,
    ) -> ResolverResult<bool> {
        self.repair_active_pointer(project, timestamp)?;
        let config_id = ConfigId::for_pair(&minter.id, &project.id);
        if project.active_config.as_ref() != Some(&config_id) {
            debug!(
                "event=binding_remove module=resolver status=skip reason=not_active config_id={}",
                config_id
            );
            return Ok(false);
        }

        project.active_config = None;
        project.updated_at = timestamp;
        self.store.put_project(project)?;
        if policy == UnlinkPolicy::Delete {
            self.store.delete_configuration(&config_id)?;
        }
        info!(
            "event=binding_remove module=resolver status=ok config_id={} policy={:?}",
            config_id, policy
        );
        Ok(true)
    }

    /// Makes `filter_id` the canonical filter of `core_contract` and rebuilds
    /// every project's active binding from the filter's registrations.
    ///
    /// # Contract
    /// - The filter's registrations are read first; a revert writes nothing.
    /// - Reported pairs with an unknown project or minter are skipped.
    pub fn canonicalize_filter(
        &self,
        filter_id: &Address,
        core_contract: &Address,
        timestamp: i64,
    ) -> ResolverResult<CanonicalizeReport> {
        let registered = self
            .chain
            .registered_project_minters(filter_id, core_contract)
            .map_err(reverted)?;

        let mut contract = self
            .store
            .get_core_contract(core_contract)?
            .unwrap_or_else(|| CoreContract::new(core_contract.clone(), timestamp));
        contract.canonical_filter = Some(filter_id.clone());
        contract.updated_at = timestamp;
        self.store.put_core_contract(&contract)?;

        let mut report = CanonicalizeReport::default();
        for mut project in self.store.list_projects_for_contract(core_contract)? {
            if project.active_config.take().is_some() {
                report.cleared += 1;
            }
            project.updated_at = timestamp;
            self.store.put_project(&project)?;
        }

        for (project_number, minter_id) in registered {
            let Some(mut project) = self.store.lookup(core_contract, &project_number)? else {
                debug!(
                    "event=filter_canonicalize module=resolver status=skip reason=unknown_project core_contract={} project_number={}",
                    core_contract, project_number
                );
                report.skipped += 1;
                continue;
            };
            let Some(minter) = self.store.get_minter(&minter_id)? else {
                warn!(
                    "event=filter_canonicalize module=resolver status=skip reason=unknown_minter minter_id={} project_id={}",
                    minter_id, project.id
                );
                report.skipped += 1;
                continue;
            };
            let configuration = self.register_binding(&mut project, &minter, timestamp)?;
            if project.active_config.as_ref() == Some(&configuration.id) {
                report.activated += 1;
            } else {
                report.skipped += 1;
            }
        }

        info!(
            "event=filter_canonicalize module=resolver status=ok filter_id={} core_contract={} cleared={} activated={} skipped={}",
            filter_id, core_contract, report.cleared, report.activated, report.skipped
        );
        Ok(report)
    }

    /// Creates the filter record if it is not indexed yet.
    pub fn ensure_filter(
        &self,
        filter_id: &Address,
        generation: FilterGeneration,
        core_registry: Option<&Address>,
        timestamp: i64,
    ) -> ResolverResult<MinterFilter> {
        if let Some(existing) = self.store.get_filter(filter_id)? {
            return Ok(existing);
        }
        let mut filter = MinterFilter::new(filter_id.clone(), generation, timestamp);
        filter.core_registry = core_registry.cloned();
        self.store.put_filter(&filter)?;
        info!(
            "event=filter_register module=resolver status=ok filter_id={} generation={}",
            filter_id,
            generation.as_str()
        );
        Ok(filter)
    }

    /// Updates allow-list membership of `minter_id` on `filter_id`.
    ///
    /// # Contract
    /// - Global scope also updates the minter's global flag when the minter
    ///   belongs to this filter.
    /// - Never touches project bindings.
    /// - Returns whether the allow-list changed.
    pub fn set_allowed(
        &self,
        filter_id: &Address,
        minter_id: &Address,
        scope: &AllowlistScope,
        allowed: bool,
        timestamp: i64,
    ) -> ResolverResult<bool> {
        let Some(mut filter) = self.store.get_filter(filter_id)? else {
            warn!(
                "event=allowlist_update module=resolver status=error error_code=filter_not_found filter_id={}",
                filter_id
            );
            return Err(ResolverError::FilterNotFound(filter_id.clone()));
        };
        let changed = filter.set_allowed(minter_id, scope, allowed);
        if changed {
            filter.updated_at = timestamp;
            self.store.put_filter(&filter)?;
        }

        if *scope == AllowlistScope::Global {
            if let Some(mut minter) = self.store.get_minter(minter_id)? {
                if minter.filter == *filter_id && minter.is_globally_allowlisted != allowed {
                    minter.is_globally_allowlisted = allowed;
                    minter.updated_at = timestamp;
                    self.store.put_minter(&minter)?;
                }
            }
        }
        debug!(
            "event=allowlist_update module=resolver status=ok filter_id={} minter_id={} allowed={} changed={}",
            filter_id, minter_id, allowed, changed
        );
        Ok(changed)
    }

    /// Creates or refreshes a minter record from chain state.
    ///
    /// # Contract
    /// - Type and filter are both read before anything is written.
    /// - Keeps the minter's document and global allow-list flag.
    pub fn sync_minter(&self, minter_id: &Address, timestamp: i64) -> ResolverResult<Minter> {
        let minter_type = self.chain.minter_type(minter_id).map_err(reverted)?;
        let filter = self.chain.minter_filter(minter_id).map_err(reverted)?;

        let minter = match self.store.get_minter(minter_id)? {
            Some(mut existing) => {
                existing.minter_type = minter_type;
                existing.filter = filter;
                existing.updated_at = timestamp;
                existing
            }
            None => Minter::new(minter_id.clone(), minter_type, filter, timestamp),
        };
        self.store.put_minter(&minter)?;
        info!(
            "event=minter_sync module=resolver status=ok minter_id={} minter_type={}",
            minter.id, minter.minter_type
        );
        Ok(minter)
    }

    /// Applies one document change at minter or project scope.
    pub fn apply_config_change(
        &self,
        minter_id: &Address,
        scope: &ConfigScope,
        change: &ConfigChange,
        timestamp: i64,
    ) -> ResolverResult<AttributeDocument> {
        let adapter = AttributeStoreAdapter::new(&self.store);
        let document = match scope {
            ConfigScope::Minter => {
                let mut minter = self.require_minter(minter_id)?;
                change.apply_to(&adapter, &mut minter, timestamp)?
            }
            ConfigScope::Project {
                core_contract,
                project_number,
            } => {
                let Binding {
                    mut project,
                    mut configuration,
                    ..
                } = self.resolve_or_create_binding(minter_id, core_contract, project_number, timestamp)?;
                let document = change.apply_to(&adapter, &mut configuration, timestamp)?;
                self.notify_project(&mut project, &configuration.id, timestamp)?;
                document
            }
        };
        debug!(
            "event=config_change module=resolver status=ok minter_id={} change={} key={}",
            minter_id,
            change.label(),
            change.key()
        );
        Ok(document)
    }

    pub fn set_base_price(
        &self,
        key: &BindingKey,
        price: BigInt,
        timestamp: i64,
    ) -> ResolverResult<ProjectMinterConfiguration> {
        self.mutate_binding(key, timestamp, |configuration| {
            configuration.base_price = Some(price);
            configuration.price_is_configured = true;
            Ok(())
        })
    }

    pub fn set_currency(
        &self,
        key: &BindingKey,
        symbol: &str,
        currency_address: Address,
        timestamp: i64,
    ) -> ResolverResult<ProjectMinterConfiguration> {
        self.mutate_binding(key, timestamp, |configuration| {
            configuration.currency_symbol = symbol.to_string();
            configuration.currency_address = currency_address;
            Ok(())
        })
    }

    pub fn set_purchase_enabled(
        &self,
        key: &BindingKey,
        enabled: bool,
        timestamp: i64,
    ) -> ResolverResult<ProjectMinterConfiguration> {
        self.mutate_binding(key, timestamp, |configuration| {
            configuration.purchase_enabled = enabled;
            Ok(())
        })
    }

    /// Copies the minter's reported price info into the join record.
    pub fn refresh_price_from_chain(
        &self,
        key: &BindingKey,
        timestamp: i64,
    ) -> ResolverResult<ProjectMinterConfiguration> {
        let info = self
            .chain
            .price_info(&key.minter, &key.core_contract, &key.project_number)
            .map_err(reverted)?;
        self.mutate_binding(key, timestamp, |configuration| {
            configuration.price_is_configured = info.is_configured;
            configuration.base_price = info.is_configured.then_some(info.token_price);
            configuration.currency_symbol = info.currency_symbol;
            configuration.currency_address = info.currency_address;
            Ok(())
        })
    }

    pub fn set_linear_auction(
        &self,
        key: &BindingKey,
        start_time: i64,
        end_time: i64,
        start_price: BigInt,
        base_price: BigInt,
        timestamp: i64,
    ) -> ResolverResult<ProjectMinterConfiguration> {
        self.mutate_binding(key, timestamp, |configuration| {
            apply_linear_auction(configuration, start_time, end_time, start_price, base_price);
            Ok(())
        })
    }

    /// Stores exponential auction parameters and the estimated end time.
    pub fn set_exponential_auction(
        &self,
        key: &BindingKey,
        start_time: i64,
        half_life_seconds: i64,
        start_price: BigInt,
        base_price: BigInt,
        timestamp: i64,
    ) -> ResolverResult<ProjectMinterConfiguration> {
        self.mutate_binding(key, timestamp, |configuration| {
            apply_exponential_auction(
                configuration,
                start_time,
                half_life_seconds,
                start_price,
                base_price,
            )
        })
    }

    pub fn reset_auction(
        &self,
        key: &BindingKey,
        timestamp: i64,
    ) -> ResolverResult<ProjectMinterConfiguration> {
        self.mutate_binding(key, timestamp, |configuration| {
            configuration.clear_auction();
            Ok(())
        })
    }

    /// Copies the minter's reported auction parameters into the join record.
    pub fn refresh_auction_from_chain(
        &self,
        key: &BindingKey,
        timestamp: i64,
    ) -> ResolverResult<ProjectMinterConfiguration> {
        let parameters = self
            .chain
            .auction_parameters(&key.minter, &key.core_contract, &key.project_number)
            .map_err(reverted)?;
        self.mutate_binding(key, timestamp, |configuration| match parameters {
            AuctionParameters::Unset => {
                configuration.clear_auction();
                Ok(())
            }
            AuctionParameters::Linear {
                start_time,
                end_time,
                start_price,
                base_price,
            } => {
                apply_linear_auction(configuration, start_time, end_time, start_price, base_price);
                Ok(())
            }
            AuctionParameters::Exponential {
                start_time,
                half_life_seconds,
                start_price,
                base_price,
            } => apply_exponential_auction(
                configuration,
                start_time,
                half_life_seconds,
                start_price,
                base_price,
            ),
        })
    }

    /// Estimates the price of the project's active binding at `now`.
    ///
    /// # Contract
    /// - Auction minters use their curve when all parameters are present.
    /// - Otherwise the configured base price, then the registry snapshot.
    /// - Stored auction parameters the curve rejects fall back and are logged.
    pub fn current_price(&self, project_id: &ProjectId, now: i64) -> ResolverResult<Option<BigInt>> {
        let project = self
            .store
            .get_project(project_id)?
            .ok_or_else(|| ResolverError::ProjectNotFound(project_id.clone()))?;
        let Some(configuration) = self.active_configuration(&project)? else {
            return Ok(project.current_price_snapshot);
        };
        let kind = self
            .store
            .get_minter(&configuration.minter)?
            .map(|minter| minter.kind())
            .unwrap_or(MinterKind::Other);

        let estimate = match (kind, &configuration) {
            (
                MinterKind::LinearAuction,
                ProjectMinterConfiguration {
                    start_time: Some(start_time),
                    end_time: Some(end_time),
                    start_price: Some(start_price),
                    base_price: Some(base_price),
                    ..
                },
            ) => Some(linear_price(now, *start_time, *end_time, start_price, base_price)),
            (
                MinterKind::ExponentialAuction,
                ProjectMinterConfiguration {
                    start_time: Some(start_time),
                    half_life_seconds: Some(half_life_seconds),
                    start_price: Some(start_price),
                    base_price: Some(base_price),
                    ..
                },
            ) => match exponential_price(now, *start_time, start_price, base_price, *half_life_seconds)
            {
                Ok(price) => Some(price),
                Err(err) => {
                    warn!(
                        "event=current_price module=resolver status=skip error_code=invalid_auction config_id={} error={}",
                        configuration.id, err
                    );
                    None
                }
            },
            _ => None,
        };

        Ok(estimate
            .or_else(|| {
                configuration
                    .price_is_configured
                    .then(|| configuration.base_price.clone())
                    .flatten()
            })
            .or(project.current_price_snapshot))
    }

    fn mutate_binding(
        &self,
        key: &BindingKey,
        timestamp: i64,
        mutate: impl FnOnce(&mut ProjectMinterConfiguration) -> ResolverResult<()>,
    ) -> ResolverResult<ProjectMinterConfiguration> {
        let Binding {
            mut project,
            mut configuration,
            ..
        } = self.resolve_or_create_binding(
            &key.minter,
            &key.core_contract,
            &key.project_number,
            timestamp,
        )?;
        mutate(&mut configuration)?;
        configuration.updated_at = timestamp;
        self.store.put_configuration(&configuration)?;
        self.notify_project(&mut project, &configuration.id, timestamp)?;
        Ok(configuration)
    }

    /// Bumps the project only when the changed join record is its active one.
    fn notify_project(
        &self,
        project: &mut Project,
        config_id: &ConfigId,
        timestamp: i64,
    ) -> ResolverResult<()> {
        if project.active_config.as_ref() == Some(config_id) {
            project.updated_at = timestamp;
            self.store.put_project(project)?;
        }
        Ok(())
    }

    fn is_canonical(&self, filter_id: &Address, core_contract: &Address) -> ResolverResult<bool> {
        Ok(self
            .store
            .get_core_contract(core_contract)?
            .and_then(|contract| contract.canonical_filter)
            .is_some_and(|canonical| canonical == *filter_id))
    }

    /// Clears an active pointer that is dangling or refers to another project.
    fn repair_active_pointer(&self, project: &mut Project, timestamp: i64) -> ResolverResult<()> {
        let Some(config_id) = project.active_config.clone() else {
            return Ok(());
        };
        let valid = matches!(
            self.store.get_configuration(&config_id)?,
            Some(configuration) if configuration.project == project.id
        );
        if !valid {
            warn!(
                "event=active_pointer_repair module=resolver status=error error_code=invariant_violation project_id={} config_id={}",
                project.id, config_id
            );
            project.active_config = None;
            project.updated_at = timestamp;
            self.store.put_project(project)?;
        }
        Ok(())
    }
}

fn reverted(err: ChainCallError) -> ResolverError {
    warn!(
        "event=chain_call module=resolver status=error error_code=external_call_reverted call={} target={} reason={}",
        err.call, err.target, err.reason
    );
    ResolverError::ExternalCallReverted(err)
}

fn apply_linear_auction(
    configuration: &mut ProjectMinterConfiguration,
    start_time: i64,
    end_time: i64,
    start_price: BigInt,
    base_price: BigInt,
) {
    configuration.clear_auction();
    let details = configuration
        .details()
        .with_entry_set(START_TIME_KEY, DocValue::from(start_time))
        .with_entry_set(END_TIME_KEY, DocValue::from(end_time))
        .with_entry_set(START_PRICE_KEY, DocValue::from(start_price.clone()));
    configuration.extra_minter_details = details.serialize();
    configuration.start_time = Some(start_time);
    configuration.end_time = Some(end_time);
    configuration.start_price = Some(start_price);
    configuration.base_price = Some(base_price);
    configuration.price_is_configured = true;
}

fn apply_exponential_auction(
    configuration: &mut ProjectMinterConfiguration,
    start_time: i64,
    half_life_seconds: i64,
    start_price: BigInt,
    base_price: BigInt,
) -> ResolverResult<()> {
    let duration = exponential_duration_to_base_price(&start_price, &base_price, half_life_seconds)?;
    let approximate_end = start_time
        .checked_add(duration)
        .ok_or(AuctionMathError::DurationOverflow)?;

    configuration.clear_auction();
    let details = configuration
        .details()
        .with_entry_set(START_TIME_KEY, DocValue::from(start_time))
        .with_entry_set(HALF_LIFE_SECONDS_KEY, DocValue::from(half_life_seconds))
        .with_entry_set(START_PRICE_KEY, DocValue::from(start_price.clone()))
        .with_entry_set(APPROXIMATE_EXP_END_TIME_KEY, DocValue::from(approximate_end));
    configuration.extra_minter_details = details.serialize();
    configuration.start_time = Some(start_time);
    configuration.half_life_seconds = Some(half_life_seconds);
    configuration.start_price = Some(start_price);
    configuration.approximate_exp_end_time = Some(approximate_end);
    configuration.base_price = Some(base_price);
    configuration.price_is_configured = true;
    Ok(())
}
