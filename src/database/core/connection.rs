//! Database connection management
//!
//! This module provides the connection wrapper used by every component that
//! talks to the database. Queries go through a [`Driver`] and every query
//! fires the attached [`QueryHook`], if any.

use std::sync::Arc;
use std::time::Instant;

use super::dialect::{quote_ident, Dialect};
use super::sqlite::SqliteDriver;
use super::value::SqlValue;
use crate::database::error::DbError;
use crate::database::observer::{QueryEvent, QueryHook};

/// A backend capable of running parameterized statements and scalar queries
pub trait Driver: Send {
    /// SQL dialect spoken by this backend
    fn dialect(&self) -> Dialect;

    /// Execute a statement, returning the number of affected rows
    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64, DbError>;

    /// Run a query and return the first column of the first row, if any
    fn query_value(&mut self, sql: &str, params: &[SqlValue])
        -> Result<Option<SqlValue>, DbError>;
}

/// Core database connection wrapper
///
/// `DatabaseConn` owns a driver and an optional query hook. Both SQLite and
/// PostgreSQL connections are handled through the same interface so the
/// migration bootstrap logic never depends on a concrete backend.
pub struct DatabaseConn {
    driver: Box<dyn Driver>,
    hook: Option<Arc<dyn QueryHook>>,
}

impl DatabaseConn {
    /// Wrap an already-connected driver
    pub fn new(driver: impl Driver + 'static) -> Self {
        Self {
            driver: Box::new(driver),
            hook: None,
        }
    }

    /// Open a SQLite database at the specified path
    ///
    /// If the path is `None`, an in-memory database is created.
    pub fn open_sqlite(path: Option<&str>) -> Result<Self, DbError> {
        Ok(Self::new(SqliteDriver::open(path)?))
    }

    /// Create an in-memory SQLite database
    pub fn open_in_memory() -> Result<Self, DbError> {
        Self::open_sqlite(None)
    }

    /// Connect to PostgreSQL using settings parsed from a DSN
    #[cfg(feature = "postgres")]
    pub fn connect_postgres(config: &crate::dsn::ConnectionConfig) -> Result<Self, DbError> {
        Ok(Self::new(super::pg::PostgresDriver::connect(config)?))
    }

    /// Attach a query hook, replacing any previous one
    pub fn with_hook(mut self, hook: Arc<dyn QueryHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn set_hook(&mut self, hook: Option<Arc<dyn QueryHook>>) {
        self.hook = hook;
    }

    pub fn dialect(&self) -> Dialect {
        self.driver.dialect()
    }

    /// Execute a SQL statement with parameters
    pub fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64, DbError> {
        self.observed(sql, params, |driver| driver.execute(sql, params))
    }

    /// Run a scalar query
    pub fn query_value(
        &mut self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<Option<SqlValue>, DbError> {
        self.observed(sql, params, |driver| driver.query_value(sql, params))
    }

    /// Attach a SQLite database file as an additional schema
    ///
    /// Tables in the attached database are addressed as `<schema>.<table>`.
    /// Only SQLite connections support this.
    pub fn attach_schema(&mut self, schema: &str, path: Option<&str>) -> Result<(), DbError> {
        if self.dialect() != Dialect::Sqlite {
            return Err(DbError::QueryFailed {
                message: format!("Cannot attach schema '{}' on {}", schema, self.dialect()),
                cause: None,
            });
        }

        let sql = format!("ATTACH DATABASE ?1 AS {}", quote_ident(schema));
        self.execute(&sql, &[SqlValue::from(path.unwrap_or(":memory:"))])?;
        Ok(())
    }

    fn observed<T>(
        &mut self,
        sql: &str,
        params: &[SqlValue],
        run: impl FnOnce(&mut dyn Driver) -> Result<T, DbError>,
    ) -> Result<T, DbError> {
        let Some(hook) = self.hook.clone() else {
            return run(self.driver.as_mut());
        };

        let mut event = QueryEvent::new(sql, params.to_vec());
        hook.before_query(&event);

        let started = Instant::now();
        let result = run(self.driver.as_mut());
        event.elapsed = Some(started.elapsed());

        hook.after_query(&event);
        result
    }
}

impl std::fmt::Debug for DatabaseConn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConn")
            .field("dialect", &self.dialect())
            .field("hook", &self.hook.is_some())
            .finish()
    }
}
