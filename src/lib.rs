#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! migrate-bootstrap - schema-aware bootstrap for versioned migrations
//!
//! Before a migration engine can apply or report versions it needs its
//! tracking table. This crate finds the session's active schema, derives the
//! schema-qualified tracking table (`<schema>.gopg_migrations`), checks
//! whether it exists, and asks the engine to create it only when it is
//! missing. Running the bootstrap again against an initialized schema is a
//! no-op.
//!
//! # Feature Flags
//!
//! | Feature | Description | Key Dependencies |
//! |---------|-------------|------------------|
//! | (none) | Core bootstrap logic, SQLite driver | `rusqlite` |
//! | `postgres` | PostgreSQL driver | `postgres` |
//! | `cli` | Command-line binary | `clap`, `tracing-subscriber` |
//!
//! # Architecture
//!
//! - **[`dsn`]**: `key=value` DSN parsing into [`ConnectionConfig`]
//! - **[`database`]**: connection wrapper, drivers, query hooks
//! - **[`migration`]**: schema resolution, table naming, existence checks,
//!   the engine boundary and the bootstrap itself
//! - **[`config`]**: configuration file and environment handling
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use migrate_bootstrap::database::{DatabaseConn, QueryLogger};
//! use migrate_bootstrap::migration::{init_migration_table_if_needed, TrackingTableEngine};
//!
//! let mut db = DatabaseConn::open_sqlite(Some("app.sqlite3"))?
//!     .with_hook(Arc::new(QueryLogger::tracing()));
//!
//! let outcome = init_migration_table_if_needed(&mut db, &TrackingTableEngine::new())?;
//! println!("using {}", outcome.table());
//! ```

pub mod config;
pub mod database;
pub mod dsn;
pub mod migration;

pub use config::BootstrapConfig;
pub use dsn::{parse_connection_config, ConnectionConfig};

pub use database::{
    DatabaseConn, DbError, Dialect, Driver, QueryEvent, QueryFormatError, QueryHook, QueryLogger,
    SqlValue,
};

pub use migration::{
    get_current_schema, init_migration_table_if_needed, migration_table_exists,
    register_migration_table, BootstrapError, BootstrapOutcome, MigrationCommand,
    MigrationEngine, MigrationError, MigrationTable, TrackingTableEngine, VersionChange,
    MIGRATION_TABLE, MIGRATION_USAGE_TEXT,
};
