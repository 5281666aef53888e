//! Migration bootstrap
//!
//! - `table`: per-schema tracking table naming (`<schema>.gopg_migrations`)
//! - `schema`: current schema resolution and table existence checks
//! - `engine`: migration engine trait, command vocabulary and the built-in
//!   tracking-table engine
//! - `bootstrap`: the detect-and-initialize sequence tying them together

mod bootstrap;
mod engine;
mod schema;
mod table;

pub use bootstrap::{init_migration_table_if_needed, BootstrapError, BootstrapOutcome};
pub use engine::{
    MigrationCommand, MigrationEngine, MigrationError, TrackingTableEngine, VersionChange,
    MIGRATION_USAGE_TEXT,
};
pub use schema::{get_current_schema, migration_table_exists, search_path_entries};
pub use table::{register_migration_table, MigrationTable, MIGRATION_TABLE};
