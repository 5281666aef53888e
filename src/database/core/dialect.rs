//! SQL dialect differences between supported backends

use serde::Serialize;
use std::fmt;

/// SQL dialect spoken by a driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Postgres,
    Sqlite,
}

impl Dialect {
    /// Numbered positional placeholder, 1-based
    pub fn placeholder(&self, n: usize) -> String {
        match self {
            Dialect::Postgres => format!("${}", n),
            Dialect::Sqlite => format!("?{}", n),
        }
    }

    /// Scalar query returning the session's schema search path
    pub fn search_path_query(&self) -> &'static str {
        match self {
            Dialect::Postgres => "SHOW search_path",
            Dialect::Sqlite => "SELECT name FROM pragma_database_list ORDER BY seq LIMIT 1",
        }
    }

    /// Scalar query returning the session role's own schema, if it exists
    ///
    /// This is what a `$user` entry of the search path resolves to. SQLite
    /// has no roles.
    pub fn user_schema_query(&self) -> Option<&'static str> {
        match self {
            Dialect::Postgres => {
                Some("SELECT nspname::text FROM pg_namespace WHERE nspname = current_user")
            }
            Dialect::Sqlite => None,
        }
    }

    /// Scalar query returning whether table `$2` exists in schema `$1`
    pub fn table_exists_query(&self) -> &'static str {
        match self {
            Dialect::Postgres => {
                "SELECT EXISTS (\
                 SELECT 1 \
                 FROM   information_schema.tables \
                 WHERE  table_schema = $1::text \
                 AND    table_name = $2::text\
                 )"
            }
            Dialect::Sqlite => {
                "SELECT EXISTS (\
                 SELECT 1 \
                 FROM   pragma_table_list \
                 WHERE  schema = ?1 \
                 AND    name = ?2 \
                 AND    type = 'table'\
                 )"
            }
        }
    }

    /// Whether the backend namespaces must be created with `CREATE SCHEMA`
    ///
    /// SQLite schemas are attached databases and exist as soon as they are attached.
    pub fn supports_create_schema(&self) -> bool {
        matches!(self, Dialect::Postgres)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Postgres => write!(f, "postgres"),
            Dialect::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Quote an identifier, doubling embedded quotes
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder() {
        assert_eq!(Dialect::Postgres.placeholder(2), "$2");
        assert_eq!(Dialect::Sqlite.placeholder(1), "?1");
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("public"), "\"public\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_table_exists_query_uses_two_params() {
        for dialect in [Dialect::Postgres, Dialect::Sqlite] {
            let sql = dialect.table_exists_query();
            assert!(sql.contains(&dialect.placeholder(1)));
            assert!(sql.contains(&dialect.placeholder(2)));
        }
    }
}
