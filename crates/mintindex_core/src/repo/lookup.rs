//! Project registry seam and read-side lookup helpers.
//!
//! Project creation and the token-id layout belong to the project registry;
//! this module only exposes what the resolver needs to read.

use crate::model::address::Address;
use crate::model::configuration::{ConfigId, ProjectMinterConfiguration};
use crate::model::project::{Project, ProjectId};
use crate::repo::{RegistryStore, RepoResult};
use num_bigint::BigInt;

/// Token ids of one project occupy `[n * STRIDE, (n + 1) * STRIDE)`.
pub const TOKEN_ID_PROJECT_STRIDE: u64 = 1_000_000;

/// Project reference as carried by an event: a project number or a token id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectRef {
    Number(BigInt),
    Token(BigInt),
}

/// Read interface of the external project registry.
pub trait ProjectRegistry {
    /// Looks up a project; `None` when the registry has not created it.
    fn lookup(&self, core_contract: &Address, project_number: &BigInt)
        -> RepoResult<Option<Project>>;

    /// Maps a token id to the project number that minted it.
    fn project_number_for_token(&self, token_id: &BigInt) -> BigInt {
        token_id / BigInt::from(TOKEN_ID_PROJECT_STRIDE)
    }

    /// Resolves an event-level project reference to a project number.
    fn resolve_project_number(&self, reference: &ProjectRef) -> BigInt {
        match reference {
            ProjectRef::Number(number) => number.clone(),
            ProjectRef::Token(token_id) => self.project_number_for_token(token_id),
        }
    }
}

impl<S: RegistryStore + ?Sized> ProjectRegistry for S {
    fn lookup(
        &self,
        core_contract: &Address,
        project_number: &BigInt,
    ) -> RepoResult<Option<Project>> {
        self.get_project(&ProjectId::new(core_contract.clone(), project_number.clone()))
    }
}

/// Loads the join record for `(minter, project)`, if one exists.
pub fn find_binding<S: RegistryStore + ?Sized>(
    store: &S,
    minter: &Address,
    project: &ProjectId,
) -> RepoResult<Option<ProjectMinterConfiguration>> {
    store.get_configuration(&ConfigId::for_pair(minter, project))
}

/// Loads the join record the project's active pointer refers to.
///
/// A dangling pointer reads as `None`; the resolver repairs it.
pub fn active_binding<S: RegistryStore + ?Sized>(
    store: &S,
    project: &Project,
) -> RepoResult<Option<ProjectMinterConfiguration>> {
    match project.active_config.as_ref() {
        Some(config_id) => store.get_configuration(config_id),
        None => Ok(None),
    }
}
