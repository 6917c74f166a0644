//! Registry store contracts and persistence implementations.
//!
//! # Responsibility
//! - Define the load/save/delete-by-id interface the resolver is built on.
//! - Keep SQL details out of the resolver and event processing code.
//!
//! # Invariants
//! - `put_*` is a whole-record upsert; there are no field-level writes.
//! - `get_*` returns `Ok(None)` for unknown ids; `NotFound` is decided by callers.

use crate::db::DbError;
use crate::model::address::Address;
use crate::model::configuration::{ConfigId, ProjectMinterConfiguration};
use crate::model::filter::MinterFilter;
use crate::model::minter::Minter;
use crate::model::project::{CoreContract, Project, ProjectId};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod lookup;
pub mod sqlite;

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage-level error for registry persistence.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Persisted row cannot be converted back into a record.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "registry store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted registry data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::UninitializedConnection { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Entity store injected into the resolver.
pub trait RegistryStore {
    fn get_minter(&self, id: &Address) -> RepoResult<Option<Minter>>;
    fn put_minter(&self, minter: &Minter) -> RepoResult<()>;

    fn get_filter(&self, id: &Address) -> RepoResult<Option<MinterFilter>>;
    fn put_filter(&self, filter: &MinterFilter) -> RepoResult<()>;

    fn get_core_contract(&self, id: &Address) -> RepoResult<Option<CoreContract>>;
    fn put_core_contract(&self, contract: &CoreContract) -> RepoResult<()>;

    fn get_project(&self, id: &ProjectId) -> RepoResult<Option<Project>>;
    /// Upserts a project. Only the project registry creates new projects.
    fn put_project(&self, project: &Project) -> RepoResult<()>;
    /// Lists known projects of one core contract ordered by project number.
    fn list_projects_for_contract(&self, core_contract: &Address) -> RepoResult<Vec<Project>>;

    fn get_configuration(&self, id: &ConfigId) -> RepoResult<Option<ProjectMinterConfiguration>>;
    fn put_configuration(&self, configuration: &ProjectMinterConfiguration) -> RepoResult<()>;
    /// Deletes one join record. Returns `false` when it did not exist.
    fn delete_configuration(&self, id: &ConfigId) -> RepoResult<bool>;
    /// Lists every join record (active or detached) of one project.
    fn list_configurations_for_project(
        &self,
        project: &ProjectId,
    ) -> RepoResult<Vec<ProjectMinterConfiguration>>;
}
