//! SQLite driver
//!
//! SQLite has no `CREATE SCHEMA`; each attached database is a schema and the
//! first database on the list (`main`) is the active one.

use rusqlite::{params_from_iter, Connection};

use super::connection::Driver;
use super::dialect::Dialect;
use super::value::SqlValue;
use crate::database::error::DbError;

pub struct SqliteDriver {
    conn: Connection,
}

impl SqliteDriver {
    /// Open a database at the specified path, or in memory when `None`
    pub fn open(path: Option<&str>) -> Result<Self, DbError> {
        let conn = match path {
            Some(p) => Connection::open(p).map_err(|e| {
                DbError::ConnectionFailed(format!("Failed to open database at '{}': {}", p, e))
            })?,
            None => Connection::open_in_memory().map_err(|e| {
                DbError::ConnectionFailed(format!("Failed to create in-memory database: {}", e))
            })?,
        };

        let driver = SqliteDriver { conn };
        driver.configure()?;
        Ok(driver)
    }

    fn configure(&self) -> Result<(), DbError> {
        // in-memory databases answer "memory" here, which is fine
        let _: String = self
            .conn
            .query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;

        self.conn.execute("PRAGMA synchronous=NORMAL", [])?;
        self.conn.execute("PRAGMA foreign_keys=ON", [])?;

        Ok(())
    }

    /// Borrow the underlying rusqlite connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl Driver for SqliteDriver {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64, DbError> {
        let affected = self.conn.execute(sql, params_from_iter(params.iter()))?;
        Ok(affected as u64)
    }

    fn query_value(
        &mut self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<Option<SqlValue>, DbError> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        let value = match rows.next()? {
            Some(row) => Some(SqlValue::from(row.get_ref(0)?)),
            None => None,
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.sqlite3");
        let path = path.to_str().unwrap();

        {
            let mut driver = SqliteDriver::open(Some(path)).unwrap();
            driver
                .execute("CREATE TABLE t (id INTEGER)", &[])
                .unwrap();
        }

        let mut driver = SqliteDriver::open(Some(path)).unwrap();
        let exists = driver
            .query_value(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                &[SqlValue::from("t")],
            )
            .unwrap();
        assert_eq!(exists, Some(SqlValue::Int(1)));
    }

    #[test]
    fn test_open_invalid_path() {
        let result = SqliteDriver::open(Some("/nonexistent/dir/test.sqlite3"));
        assert!(matches!(result, Err(DbError::ConnectionFailed(_))));
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let mut driver = SqliteDriver::open(None).unwrap();
        let fk = driver.query_value("PRAGMA foreign_keys", &[]).unwrap();
        assert_eq!(fk, Some(SqlValue::Int(1)));
        assert!(driver.connection().is_autocommit());
    }
}
