//! Core of the minter-configuration indexer.
//! Resolves which minter configuration is active for each project and keeps
//! the per-record attribute documents in sync with observed events.

pub mod auction;
pub mod chain;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use chain::{AuctionParameters, ChainCallError, ChainResult, ChainState, PriceInfo};
pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::address::Address;
pub use model::document::{AttributeDocument, DocValue};
pub use repo::lookup::{ProjectRef, ProjectRegistry};
pub use repo::sqlite::SqliteRegistryStore;
pub use repo::{RegistryStore, RepoError, RepoResult};
pub use service::event_processor::{EventOutcome, EventProcessor, MinterEvent, ProjectTarget};
pub use service::resolver::{
    BindingKey, ConfigurationResolver, ResolverConfig, ResolverError, ResolverResult,
    UnlinkPolicy,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
