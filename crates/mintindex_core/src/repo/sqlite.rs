//! SQLite-backed registry store.
//!
//! # Invariants
//! - Big integers are stored as decimal TEXT, addresses as lowercase TEXT.
//! - Filter allow-lists are replaced as a whole inside one transaction.
//! - Read paths reject unparseable rows instead of masking them.

use crate::db::migrations::{current_version, latest_version};
use crate::model::address::Address;
use crate::model::configuration::{ConfigId, ProjectMinterConfiguration};
use crate::model::filter::{FilterGeneration, MinterFilter};
use crate::model::minter::Minter;
use crate::model::project::{CoreContract, Project, ProjectId};
use crate::repo::{RegistryStore, RepoError, RepoResult};
use num_bigint::BigInt;
use rusqlite::{params, Connection, OptionalExtension, Row};

const GLOBAL_SCOPE: &str = "";

const CONFIGURATION_SELECT_SQL: &str = "SELECT
    id,
    minter_id,
    core_contract,
    project_number,
    base_price,
    price_is_configured,
    currency_symbol,
    currency_address,
    purchase_enabled,
    start_time,
    end_time,
    start_price,
    half_life_seconds,
    approximate_exp_end_time,
    extra_minter_details,
    created_at,
    updated_at
FROM project_minter_configurations";

const PROJECT_SELECT_SQL: &str = "SELECT
    core_contract,
    project_number,
    active_config,
    current_price_snapshot,
    updated_at
FROM projects";

/// Registry store over a migrated SQLite connection.
pub struct SqliteRegistryStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRegistryStore<'conn> {
    /// Creates a store, rejecting connections that are not fully migrated.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let actual_version = current_version(conn)?;
        let expected_version = latest_version();
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self { conn })
    }
}

impl RegistryStore for SqliteRegistryStore<'_> {
    fn get_minter(&self, id: &Address) -> RepoResult<Option<Minter>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, minter_type, filter_id, is_globally_allowlisted,
                    extra_minter_details, updated_at
             FROM minters WHERE id = ?1;",
        )?;
        let mut rows = stmt.query([id.as_str()])?;
        match rows.next()? {
            Some(row) => Ok(Some(Minter {
                id: parse_address(row, "id")?,
                minter_type: row.get("minter_type")?,
                filter: parse_address(row, "filter_id")?,
                is_globally_allowlisted: parse_flag(row, "is_globally_allowlisted")?,
                extra_minter_details: row.get("extra_minter_details")?,
                updated_at: row.get("updated_at")?,
            })),
            None => Ok(None),
        }
    }

    fn put_minter(&self, minter: &Minter) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO minters (
                id, minter_type, filter_id, is_globally_allowlisted,
                extra_minter_details, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                minter_type = excluded.minter_type,
                filter_id = excluded.filter_id,
                is_globally_allowlisted = excluded.is_globally_allowlisted,
                extra_minter_details = excluded.extra_minter_details,
                updated_at = excluded.updated_at;",
            params![
                minter.id.as_str(),
                minter.minter_type.as_str(),
                minter.filter.as_str(),
                minter.is_globally_allowlisted,
                minter.extra_minter_details.as_str(),
                minter.updated_at,
            ],
        )?;
        Ok(())
    }

    fn get_filter(&self, id: &Address) -> RepoResult<Option<MinterFilter>> {
        let header = self
            .conn
            .query_row(
                "SELECT generation, core_registry, updated_at
                 FROM minter_filters WHERE id = ?1;",
                [id.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;
        let Some((generation_text, core_registry, updated_at)) = header else {
            return Ok(None);
        };

        let generation = FilterGeneration::parse(generation_text.as_str()).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid generation `{generation_text}` in minter_filters.generation"
            ))
        })?;
        let mut filter = MinterFilter::new(id.clone(), generation, updated_at);
        filter.core_registry = core_registry
            .as_deref()
            .map(|value| address_from_text(value, "minter_filters.core_registry"))
            .transpose()?;

        let mut stmt = self.conn.prepare(
            "SELECT scope, minter_id FROM minter_filter_allowlists
             WHERE filter_id = ?1
             ORDER BY scope ASC, position ASC;",
        )?;
        let mut rows = stmt.query([id.as_str()])?;
        while let Some(row) = rows.next()? {
            let scope: String = row.get("scope")?;
            let minter = parse_address(row, "minter_id")?;
            if scope == GLOBAL_SCOPE {
                filter.global_allowlist.push(minter);
            } else {
                let contract = address_from_text(&scope, "minter_filter_allowlists.scope")?;
                filter
                    .contract_allowlists
                    .entry(contract)
                    .or_default()
                    .push(minter);
            }
        }
        Ok(Some(filter))
    }

    fn put_filter(&self, filter: &MinterFilter) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO minter_filters (id, generation, core_registry, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                generation = excluded.generation,
                core_registry = excluded.core_registry,
                updated_at = excluded.updated_at;",
            params![
                filter.id.as_str(),
                filter.generation.as_str(),
                filter.core_registry.as_ref().map(Address::as_str),
                filter.updated_at,
            ],
        )?;
        tx.execute(
            "DELETE FROM minter_filter_allowlists WHERE filter_id = ?1;",
            [filter.id.as_str()],
        )?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO minter_filter_allowlists (filter_id, scope, minter_id, position)
                 VALUES (?1, ?2, ?3, ?4);",
            )?;
            let scoped = std::iter::once((GLOBAL_SCOPE, &filter.global_allowlist)).chain(
                filter
                    .contract_allowlists
                    .iter()
                    .map(|(contract, list)| (contract.as_str(), list)),
            );
            for (scope, list) in scoped {
                for (position, minter) in list.iter().enumerate() {
                    insert.execute(params![
                        filter.id.as_str(),
                        scope,
                        minter.as_str(),
                        position as i64,
                    ])?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn get_core_contract(&self, id: &Address) -> RepoResult<Option<CoreContract>> {
        let row = self
            .conn
            .query_row(
                "SELECT canonical_filter, updated_at FROM core_contracts WHERE id = ?1;",
                [id.as_str()],
                |row| Ok((row.get::<_, Option<String>>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;
        let Some((canonical_filter, updated_at)) = row else {
            return Ok(None);
        };
        Ok(Some(CoreContract {
            id: id.clone(),
            canonical_filter: canonical_filter
                .as_deref()
                .map(|value| address_from_text(value, "core_contracts.canonical_filter"))
                .transpose()?,
            updated_at,
        }))
    }

    fn put_core_contract(&self, contract: &CoreContract) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO core_contracts (id, canonical_filter, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET
                canonical_filter = excluded.canonical_filter,
                updated_at = excluded.updated_at;",
            params![
                contract.id.as_str(),
                contract.canonical_filter.as_ref().map(Address::as_str),
                contract.updated_at,
            ],
        )?;
        Ok(())
    }

    fn get_project(&self, id: &ProjectId) -> RepoResult<Option<Project>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PROJECT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_project_row(row)?)),
            None => Ok(None),
        }
    }

    fn put_project(&self, project: &Project) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO projects (
                id, core_contract, project_number, active_config,
                current_price_snapshot, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                active_config = excluded.active_config,
                current_price_snapshot = excluded.current_price_snapshot,
                updated_at = excluded.updated_at;",
            params![
                project.id.to_string(),
                project.id.core_contract.as_str(),
                project.id.project_number.to_string(),
                project.active_config.as_ref().map(ConfigId::as_str),
                project.current_price_snapshot.as_ref().map(BigInt::to_string),
                project.updated_at,
            ],
        )?;
        Ok(())
    }

    fn list_projects_for_contract(&self, core_contract: &Address) -> RepoResult<Vec<Project>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PROJECT_SELECT_SQL}
             WHERE core_contract = ?1
             ORDER BY length(project_number) ASC, project_number ASC;"
        ))?;
        let mut rows = stmt.query([core_contract.as_str()])?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next()? {
            projects.push(parse_project_row(row)?);
        }
        Ok(projects)
    }

    fn get_configuration(&self, id: &ConfigId) -> RepoResult<Option<ProjectMinterConfiguration>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CONFIGURATION_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.as_str()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_configuration_row(row)?)),
            None => Ok(None),
        }
    }

    fn put_configuration(&self, configuration: &ProjectMinterConfiguration) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO project_minter_configurations (
                id, minter_id, project_id, core_contract, project_number,
                base_price, price_is_configured, currency_symbol, currency_address,
                purchase_enabled, start_time, end_time, start_price, half_life_seconds,
                approximate_exp_end_time, extra_minter_details, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
             ON CONFLICT(id) DO UPDATE SET
                base_price = excluded.base_price,
                price_is_configured = excluded.price_is_configured,
                currency_symbol = excluded.currency_symbol,
                currency_address = excluded.currency_address,
                purchase_enabled = excluded.purchase_enabled,
                start_time = excluded.start_time,
                end_time = excluded.end_time,
                start_price = excluded.start_price,
                half_life_seconds = excluded.half_life_seconds,
                approximate_exp_end_time = excluded.approximate_exp_end_time,
                extra_minter_details = excluded.extra_minter_details,
                updated_at = excluded.updated_at;",
            params![
                configuration.id.as_str(),
                configuration.minter.as_str(),
                configuration.project.to_string(),
                configuration.project.core_contract.as_str(),
                configuration.project.project_number.to_string(),
                configuration.base_price.as_ref().map(BigInt::to_string),
                configuration.price_is_configured,
                configuration.currency_symbol.as_str(),
                configuration.currency_address.as_str(),
                configuration.purchase_enabled,
                configuration.start_time,
                configuration.end_time,
                configuration.start_price.as_ref().map(BigInt::to_string),
                configuration.half_life_seconds,
                configuration.approximate_exp_end_time,
                configuration.extra_minter_details.as_str(),
                configuration.created_at,
                configuration.updated_at,
            ],
        )?;
        Ok(())
    }

    fn delete_configuration(&self, id: &ConfigId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM project_minter_configurations WHERE id = ?1;",
            [id.as_str()],
        )?;
        Ok(changed > 0)
    }

    fn list_configurations_for_project(
        &self,
        project: &ProjectId,
    ) -> RepoResult<Vec<ProjectMinterConfiguration>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CONFIGURATION_SELECT_SQL}
             WHERE project_id = ?1
             ORDER BY created_at ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([project.to_string()])?;
        let mut configurations = Vec::new();
        while let Some(row) = rows.next()? {
            configurations.push(parse_configuration_row(row)?);
        }
        Ok(configurations)
    }
}

fn parse_project_row(row: &Row<'_>) -> RepoResult<Project> {
    let id = ProjectId {
        core_contract: parse_address(row, "core_contract")?,
        project_number: parse_bigint(row, "project_number")?,
    };
    Ok(Project {
        id,
        active_config: row
            .get::<_, Option<String>>("active_config")?
            .map(ConfigId::from_stored),
        current_price_snapshot: parse_optional_bigint(row, "current_price_snapshot")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_configuration_row(row: &Row<'_>) -> RepoResult<ProjectMinterConfiguration> {
    let project = ProjectId {
        core_contract: parse_address(row, "core_contract")?,
        project_number: parse_bigint(row, "project_number")?,
    };
    Ok(ProjectMinterConfiguration {
        id: ConfigId::from_stored(row.get::<_, String>("id")?),
        minter: parse_address(row, "minter_id")?,
        project,
        base_price: parse_optional_bigint(row, "base_price")?,
        price_is_configured: parse_flag(row, "price_is_configured")?,
        currency_symbol: row.get("currency_symbol")?,
        currency_address: parse_address(row, "currency_address")?,
        purchase_enabled: parse_flag(row, "purchase_enabled")?,
        start_time: row.get("start_time")?,
        end_time: row.get("end_time")?,
        start_price: parse_optional_bigint(row, "start_price")?,
        half_life_seconds: row.get("half_life_seconds")?,
        approximate_exp_end_time: row.get("approximate_exp_end_time")?,
        extra_minter_details: row.get("extra_minter_details")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_address(row: &Row<'_>, column: &str) -> RepoResult<Address> {
    let text: String = row.get(column)?;
    address_from_text(&text, column)
}

fn address_from_text(text: &str, column: &str) -> RepoResult<Address> {
    Address::parse(text)
        .map_err(|_| RepoError::InvalidData(format!("invalid address `{text}` in {column}")))
}

fn parse_bigint(row: &Row<'_>, column: &str) -> RepoResult<BigInt> {
    let text: String = row.get(column)?;
    text.parse::<BigInt>()
        .map_err(|_| RepoError::InvalidData(format!("invalid integer `{text}` in {column}")))
}

fn parse_optional_bigint(row: &Row<'_>, column: &str) -> RepoResult<Option<BigInt>> {
    match row.get::<_, Option<String>>(column)? {
        Some(text) => text.parse::<BigInt>().map(Some).map_err(|_| {
            RepoError::InvalidData(format!("invalid integer `{text}` in {column}"))
        }),
        None => Ok(None),
    }
}

fn parse_flag(row: &Row<'_>, column: &str) -> RepoResult<bool> {
    match row.get::<_, i64>(column)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid flag value `{other}` in {column}"
        ))),
    }
}
