//! Connection configuration from DSN strings
//!
//! Parses the libpq-style `key=value` form, e.g.
//! `host=localhost port=5432 user=postgres dbname=postgres password=secret`.
//! Parsing is best-effort: malformed tokens and unknown keys are skipped and
//! anything missing keeps its default.

use serde::Serialize;

/// Default host used when the DSN does not name one
pub const DEFAULT_HOST: &str = "localhost";

/// Default port used when the DSN does not name one
pub const DEFAULT_PORT: &str = "5432";

/// Structured connection settings parsed from a DSN
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: String,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub database: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT.to_string(),
            user: String::new(),
            password: String::new(),
            database: String::new(),
        }
    }
}

impl ConnectionConfig {
    /// Parse a space-separated `key=value` DSN
    ///
    /// Recognized keys are `host`, `port`, `user`, `password` and `dbname`.
    /// Each token is split on its first `=`; tokens without a non-empty key
    /// and value are ignored. This never fails.
    pub fn from_dsn(dsn: &str) -> Self {
        let mut opts = Self::default();

        // split on single spaces: runs of spaces yield empty tokens, skipped below
        for token in dsn.trim().split(' ') {
            let Some((key, value)) = token.split_once('=') else {
                continue;
            };
            if key.is_empty() || value.is_empty() {
                continue;
            }

            match key {
                "host" => opts.host = value.to_string(),
                "port" => opts.port = value.to_string(),
                "user" => opts.user = value.to_string(),
                "password" => opts.password = value.to_string(),
                "dbname" => opts.database = value.to_string(),
                _ => {}
            }
        }

        opts
    }

    /// Network address in `host:port` form
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Render back to a DSN string with the password masked
    pub fn redacted(&self) -> String {
        let mut parts = vec![format!("host={}", self.host), format!("port={}", self.port)];
        if !self.user.is_empty() {
            parts.push(format!("user={}", self.user));
        }
        if !self.password.is_empty() {
            parts.push("password=****".to_string());
        }
        if !self.database.is_empty() {
            parts.push(format!("dbname={}", self.database));
        }
        parts.join(" ")
    }

    /// Build a `postgres` client configuration
    ///
    /// Fails only when the port is not a valid number.
    #[cfg(feature = "postgres")]
    pub fn to_pg_config(&self) -> anyhow::Result<postgres::Config> {
        let port: u16 = self
            .port
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid port '{}': {}", self.port, e))?;

        let mut config = postgres::Config::new();
        config.host(&self.host).port(port);
        if !self.user.is_empty() {
            config.user(&self.user);
        }
        if !self.password.is_empty() {
            config.password(&self.password);
        }
        if !self.database.is_empty() {
            config.dbname(&self.database);
        }
        Ok(config)
    }
}

/// Parse a DSN into a [`ConnectionConfig`]
pub fn parse_connection_config(dsn: &str) -> ConnectionConfig {
    ConnectionConfig::from_dsn(dsn)
}
