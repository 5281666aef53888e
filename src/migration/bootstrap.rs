//! Migration table bootstrap
//!
//! Brings a database to the point where migration commands can run:
//!
//! ```text
//! START -> SCHEMA_RESOLVED -> TABLE_REGISTERED -> EXISTENCE_CHECKED -> DONE
//!                                                        |              ^
//!                                                        +-> INITIALIZING
//! ```
//!
//! The schema is resolved once per call and that single value drives both
//! the table name and the existence check. Running the bootstrap against an
//! initialized schema does nothing.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::database::{DatabaseConn, DbError};
use crate::migration::{
    get_current_schema, migration_table_exists, register_migration_table, MigrationCommand,
    MigrationEngine, MigrationError, MigrationTable,
};

/// Bootstrap failures, by the stage that failed
///
/// All of them mean the database cannot be trusted for migrations; the
/// caller is expected to abort.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Failed to resolve current schema")]
    ResolveSchema(#[source] DbError),

    #[error("Failed to check for migration table {table}")]
    CheckExistence {
        table: MigrationTable,
        #[source]
        source: DbError,
    },

    #[error("Failed to initialize migration table {table}")]
    Initialize {
        table: MigrationTable,
        #[source]
        source: MigrationError,
    },
}

/// What the bootstrap found and did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BootstrapOutcome {
    /// The tracking table was already there; nothing was changed
    AlreadyInitialized { table: MigrationTable },
    /// The engine's `init` command created the tracking table
    Initialized { table: MigrationTable },
}

impl BootstrapOutcome {
    pub fn table(&self) -> &MigrationTable {
        match self {
            BootstrapOutcome::AlreadyInitialized { table } => table,
            BootstrapOutcome::Initialized { table } => table,
        }
    }

    pub fn initialized(&self) -> bool {
        matches!(self, BootstrapOutcome::Initialized { .. })
    }
}

/// Ensure the migration tracking table exists in the session's current schema
///
/// Resolves the schema, derives `<schema>.gopg_migrations`, checks whether it
/// exists and runs the engine's `init` command only when it does not. The
/// first failure stops the sequence and is returned.
pub fn init_migration_table_if_needed(
    db: &mut DatabaseConn,
    engine: &dyn MigrationEngine,
) -> Result<BootstrapOutcome, BootstrapError> {
    let schema = get_current_schema(db).map_err(BootstrapError::ResolveSchema)?;
    debug!("Current schema: {}", schema);

    let table = register_migration_table(&schema);

    let exists = migration_table_exists(db, &table).map_err(|source| {
        BootstrapError::CheckExistence {
            table: table.clone(),
            source,
        }
    })?;

    if exists {
        debug!("Migration table {} already exists", table);
        return Ok(BootstrapOutcome::AlreadyInitialized { table });
    }

    info!("Migration table {} not found, initializing", table);
    engine
        .run(db, &table, MigrationCommand::Init)
        .map_err(|source| BootstrapError::Initialize {
            table: table.clone(),
            source,
        })?;

    Ok(BootstrapOutcome::Initialized { table })
}
