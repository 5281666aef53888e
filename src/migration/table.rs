//! Migration tracking table naming
//!
//! Every schema gets its own tracking table, `<schema>.gopg_migrations`, so
//! several schemas in one database never share bookkeeping. The qualified
//! name is a plain value handed to each engine call; nothing is registered
//! globally.

use serde::Serialize;
use std::fmt;

use crate::database::quote_ident;

/// Unqualified name of the migration tracking table
pub const MIGRATION_TABLE: &str = "gopg_migrations";

/// A migration tracking table qualified by its schema
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MigrationTable {
    schema: String,
    table: String,
}

impl MigrationTable {
    /// The tracking table for `schema`
    pub fn for_schema(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: MIGRATION_TABLE.to_string(),
        }
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// `<schema>.<table>` as plain text
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }

    /// `"<schema>"."<table>"`, safe to splice into SQL
    pub fn quoted(&self) -> String {
        format!("{}.{}", quote_ident(&self.schema), quote_ident(&self.table))
    }
}

impl fmt::Display for MigrationTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

/// Derive the tracking table that migration commands for `schema` must use
pub fn register_migration_table(schema: &str) -> MigrationTable {
    let table = MigrationTable::for_schema(schema);
    tracing::debug!("Using migration table {}", table);
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_name() {
        assert_eq!(
            register_migration_table("public").qualified_name(),
            "public.gopg_migrations"
        );
        assert_eq!(
            register_migration_table("tenant_a").to_string(),
            "tenant_a.gopg_migrations"
        );
    }

    #[test]
    fn test_quoted() {
        let table = MigrationTable::for_schema("Tenant A");
        assert_eq!(table.quoted(), "\"Tenant A\".\"gopg_migrations\"");
    }

    #[test]
    fn test_independent_schemas() {
        let a = register_migration_table("tenant_a");
        let b = register_migration_table("tenant_b");
        assert_ne!(a, b);
        assert_eq!(a.schema(), "tenant_a");
        assert_eq!(b.table(), MIGRATION_TABLE);
    }
}
