use anyhow::{anyhow, Result};
use config::Config;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

use crate::dsn::ConnectionConfig;

/// DSN used when neither the config file nor the environment provides one
pub const DEFAULT_DSN: &str = "host=localhost port=5432 user=postgres dbname=postgres";

/// Prefix for environment overrides, e.g. `MIGRATE_DSN`
pub const ENV_PREFIX: &str = "MIGRATE";

#[derive(Debug, Clone, Serialize)]
pub struct BootstrapConfig {
    /// PostgreSQL DSN in `key=value` form
    #[serde(skip_serializing)]
    pub dsn: String,

    /// Use this SQLite database instead of PostgreSQL
    pub sqlite_path: Option<String>,

    /// Log every query issued during the run
    pub log_queries: bool,
}

const EMPTY_CONFIG: &str = r#"### migrate-bootstrap configuration file

### PostgreSQL connection string (space-separated key=value pairs)
# dsn = "host=localhost port=5432 user=postgres dbname=postgres password="

### use a SQLite database file instead of PostgreSQL
# sqlite_path = "/path/to/database.sqlite3"

### log every query with its parameters
# log_queries = false
"#;

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            dsn: DEFAULT_DSN.to_string(),
            sqlite_path: None,
            log_queries: false,
        }
    }
}

impl BootstrapConfig {
    /// Load configuration from a TOML file and `MIGRATE_*` environment variables
    ///
    /// Without an explicit path, `$HOME/.migrate-bootstrap/config.toml` is used.
    /// A missing file is created from a commented template.
    pub fn new(path: &Option<String>) -> Result<BootstrapConfig> {
        let path = match path {
            Some(p) => p.clone(),
            None => {
                let dir = config_dir()?;
                std::fs::create_dir_all(dir.as_str())
                    .map_err(|e| anyhow!("Unable to create config directory: {}", e))?;
                format!("{}/config.toml", dir)
            }
        };

        Self::load(Path::new(&path), ENV_PREFIX)
    }

    fn load(path: &Path, env_prefix: &str) -> Result<BootstrapConfig> {
        let mut builder = Config::builder();

        if path.exists() {
            let path_str = path
                .to_str()
                .ok_or_else(|| anyhow!("Could not convert path to string"))?;
            builder = builder.add_source(config::File::with_name(path_str));
        } else {
            std::fs::write(path, EMPTY_CONFIG).map_err(|e| {
                anyhow!("Unable to create config file {}: {}", path.display(), e)
            })?;
        }

        builder = builder.add_source(config::Environment::with_prefix(env_prefix));

        let settings = builder
            .build()
            .map_err(|e| anyhow!("Failed to build configuration: {}", e))?;

        let config = settings
            .try_deserialize::<HashMap<String, String>>()
            .map_err(|e| anyhow!("Failed to deserialize configuration: {}", e))?;

        Self::from_map(&config)
    }

    fn from_map(config: &HashMap<String, String>) -> Result<BootstrapConfig> {
        let dsn = config
            .get("dsn")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_DSN.to_string());

        let sqlite_path = config
            .get("sqlite_path")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let log_queries = match config.get("log_queries").map(|s| s.to_lowercase()) {
            None => false,
            Some(v) => match v.as_str() {
                "true" | "1" | "yes" | "on" => true,
                "false" | "0" | "no" | "off" | "" => false,
                other => return Err(anyhow!("Invalid value for log_queries: {}", other)),
            },
        };

        Ok(BootstrapConfig {
            dsn,
            sqlite_path,
            log_queries,
        })
    }

    /// Connection settings parsed from the DSN
    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig::from_dsn(&self.dsn)
    }

    /// Display configuration summary
    pub fn summary(&self) -> String {
        let backend = match &self.sqlite_path {
            Some(p) => format!("sqlite ({})", p),
            None => format!("postgres ({})", self.connection_config().addr()),
        };

        [
            format!("Backend:            {}", backend),
            format!("DSN:                {}", self.connection_config().redacted()),
            format!("Log Queries:        {}", self.log_queries),
            format!("Config File:        {}", Self::config_file_path()),
        ]
        .join("\n")
    }

    /// Get the default config file path
    pub fn config_file_path() -> String {
        let home_dir = dirs::home_dir()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|| "~".to_string());
        format!("{}/.migrate-bootstrap/config.toml", home_dir)
    }
}

fn config_dir() -> Result<String> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| anyhow!("Could not find home directory"))?
        .to_str()
        .ok_or_else(|| anyhow!("Could not convert home directory path to string"))?
        .to_owned();
    Ok(format!("{}/.migrate-bootstrap", home_dir))
}
