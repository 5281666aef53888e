//! PostgreSQL driver over the blocking `postgres` client

use postgres::types::ToSql;
use postgres::{Client, NoTls};
use tracing::debug;

use super::connection::Driver;
use super::dialect::Dialect;
use super::value::{from_row, SqlValue};
use crate::database::error::DbError;
use crate::dsn::ConnectionConfig;

pub struct PostgresDriver {
    client: Client,
}

impl PostgresDriver {
    /// Connect using settings parsed from a DSN
    pub fn connect(config: &ConnectionConfig) -> Result<Self, DbError> {
        let pg_config = config
            .to_pg_config()
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!("Connecting to PostgreSQL at {}", config.addr());
        let client = pg_config.connect(NoTls).map_err(|e| {
            DbError::ConnectionFailed(format!("Failed to connect to {}: {}", config.addr(), e))
        })?;

        Ok(Self { client })
    }
}

fn bind(params: &[SqlValue]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
}

impl Driver for PostgresDriver {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64, DbError> {
        Ok(self.client.execute(sql, &bind(params))?)
    }

    fn query_value(
        &mut self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<Option<SqlValue>, DbError> {
        let rows = self.client.query(sql, &bind(params))?;
        match rows.first() {
            Some(row) => Ok(Some(from_row(row, 0)?)),
            None => Ok(None),
        }
    }
}
