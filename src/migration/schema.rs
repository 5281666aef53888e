//! Schema discovery: the session's active schema and whether a tracking
//! table already exists in it.

use crate::database::{DatabaseConn, DbError, Dialect, SqlValue};
use crate::migration::MigrationTable;

/// Search path entry standing for the session role's own schema
const USER_ENTRY: &str = "$user";

/// Resolve the schema new objects land in for this session
///
/// PostgreSQL reports the whole `search_path`; the first usable entry wins.
/// A `$user` entry is usable only when the role has a schema of its own name.
/// SQLite reports the first attached database (`main`).
pub fn get_current_schema(db: &mut DatabaseConn) -> Result<String, DbError> {
    let dialect = db.dialect();
    let raw = match db.query_value(dialect.search_path_query(), &[])? {
        Some(SqlValue::Text(s)) => s,
        Some(other) => {
            return Err(DbError::UnexpectedValue {
                context: "search path".to_string(),
                value: other.to_string(),
            })
        }
        None => String::new(),
    };

    match dialect {
        Dialect::Postgres => {
            for entry in search_path_entries(&raw) {
                if entry != USER_ENTRY {
                    return Ok(entry.to_string());
                }
                if let Some(schema) = user_schema(db)? {
                    return Ok(schema);
                }
            }
            Err(DbError::SchemaNotResolved(raw))
        }
        Dialect::Sqlite if !raw.is_empty() => Ok(raw),
        Dialect::Sqlite => Err(DbError::SchemaNotResolved(raw)),
    }
}

/// The role's own schema, when one exists
fn user_schema(db: &mut DatabaseConn) -> Result<Option<String>, DbError> {
    let Some(sql) = db.dialect().user_schema_query() else {
        return Ok(None);
    };
    match db.query_value(sql, &[])? {
        Some(SqlValue::Text(s)) => Ok(Some(s)),
        None | Some(SqlValue::Null) => Ok(None),
        Some(other) => Err(DbError::UnexpectedValue {
            context: "user schema".to_string(),
            value: other.to_string(),
        }),
    }
}

/// Entries of a PostgreSQL `search_path` value, in order
///
/// Entries are comma-separated and may be double-quoted; empty entries are
/// dropped. `$user` is returned as is.
pub fn search_path_entries(search_path: &str) -> impl Iterator<Item = &str> {
    search_path
        .split(',')
        .map(|entry| {
            let entry = entry.trim();
            entry
                .strip_prefix('"')
                .and_then(|e| e.strip_suffix('"'))
                .unwrap_or(entry)
        })
        .filter(|entry| !entry.is_empty())
}

/// Check whether the tracking table exists in its schema
pub fn migration_table_exists(
    db: &mut DatabaseConn,
    table: &MigrationTable,
) -> Result<bool, DbError> {
    let sql = db.dialect().table_exists_query();
    let value = db.query_value(
        sql,
        &[SqlValue::from(table.schema()), SqlValue::from(table.table())],
    )?;

    match value {
        Some(v) => v.as_bool().ok_or_else(|| DbError::UnexpectedValue {
            context: format!("existence of {}", table),
            value: v.to_string(),
        }),
        None => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::register_migration_table;

    fn entries(search_path: &str) -> Vec<&str> {
        search_path_entries(search_path).collect()
    }

    #[test]
    fn test_search_path_entries() {
        assert_eq!(entries("public"), vec!["public"]);
        assert_eq!(entries("\"$user\", public"), vec!["$user", "public"]);
        assert_eq!(entries("tenant_a, public"), vec!["tenant_a", "public"]);
        assert_eq!(entries("\"My Schema\",public"), vec!["My Schema", "public"]);
        assert_eq!(entries(" , public"), vec!["public"]);
        assert!(entries("").is_empty());
    }

    #[test]
    fn test_current_schema_sqlite() {
        let mut db = DatabaseConn::open_in_memory().unwrap();
        assert_eq!(get_current_schema(&mut db).unwrap(), "main");
    }

    #[test]
    fn test_table_exists() {
        let mut db = DatabaseConn::open_in_memory().unwrap();
        let table = register_migration_table("main");
        assert!(!migration_table_exists(&mut db, &table).unwrap());

        db.execute(&format!("CREATE TABLE {} (id INTEGER)", table.quoted()), &[]).unwrap();
        assert!(migration_table_exists(&mut db, &table).unwrap());
    }

    #[test]
    fn test_table_exists_is_per_schema() {
        let mut db = DatabaseConn::open_in_memory().unwrap();
        db.attach_schema("tenant_a", None).unwrap();

        let main = register_migration_table("main");
        let tenant = register_migration_table("tenant_a");
        db.execute(&format!("CREATE TABLE {} (id INTEGER)", tenant.quoted()), &[]).unwrap();

        assert!(migration_table_exists(&mut db, &tenant).unwrap());
        assert!(!migration_table_exists(&mut db, &main).unwrap());
    }

    #[test]
    fn test_views_do_not_count() {
        let mut db = DatabaseConn::open_in_memory().unwrap();
        db.execute("CREATE VIEW gopg_migrations AS SELECT 1 AS id", &[])
            .unwrap();
        let table = register_migration_table("main");
        assert!(!migration_table_exists(&mut db, &table).unwrap());
    }
}
