use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use migrate_bootstrap::*;
use serde_json::json;
use tracing::{error, info, warn, Level};

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true, after_help = MIGRATION_USAGE_TEXT)]
struct Cli {
    /// configuration file path, by default $HOME/.migrate-bootstrap/config.toml is used
    #[clap(short, long)]
    config: Option<String>,

    /// PostgreSQL DSN, e.g. "host=localhost port=5432 user=postgres dbname=postgres"
    #[clap(long)]
    dsn: Option<String>,

    /// Use a SQLite database file instead of PostgreSQL
    #[clap(long, conflicts_with = "dsn")]
    sqlite: Option<String>,

    /// Print debug information
    #[clap(long)]
    debug: bool,

    /// Log every query with its parameters
    #[clap(long)]
    log_queries: bool,

    /// Output results as JSON
    #[clap(long)]
    json: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the migration table in the current schema if it is missing
    Bootstrap,

    /// Create the migration table (runs the engine's init command)
    Init,

    /// Run available migrations, optionally up to a target version
    Up {
        #[clap(value_name = "TARGET")]
        target: Option<i64>,
    },

    /// Revert the last migration
    Down,

    /// Revert all migrations
    Reset,

    /// Print the current database version
    Version,

    /// Set the database version without running migrations
    #[clap(name = "set_version", alias = "set-version")]
    SetVersion {
        #[clap(value_name = "VERSION")]
        version: i64,
    },

    /// Print the effective configuration
    Config,
}

fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.debug { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = BootstrapConfig::new(&cli.config)?;
    if let Some(dsn) = cli.dsn {
        config.dsn = dsn;
        config.sqlite_path = None;
    }
    if let Some(path) = cli.sqlite {
        config.sqlite_path = Some(path);
    }
    if cli.log_queries {
        config.log_queries = true;
    }

    let command = match cli.command {
        Commands::Config => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("{}", config.summary());
            }
            return Ok(());
        }
        Commands::Bootstrap => None,
        Commands::Init => Some(MigrationCommand::Init),
        Commands::Up { target } => Some(MigrationCommand::Up { target }),
        Commands::Down => Some(MigrationCommand::Down),
        Commands::Reset => Some(MigrationCommand::Reset),
        Commands::Version => Some(MigrationCommand::Version),
        Commands::SetVersion { version } => Some(MigrationCommand::SetVersion(version)),
    };

    let mut db = connect(&config)?;
    if config.log_queries {
        db.set_hook(Some(Arc::new(QueryLogger::new(
            |query, _params| info!(target: "query", "{}", query),
            |err| warn!(target: "query", "Failed to format query: {}", err),
        ))));
    }

    let engine = TrackingTableEngine::new();
    let outcome = init_migration_table_if_needed(&mut db, &engine)?;

    let Some(command) = command else {
        if cli.json {
            println!("{}", serde_json::to_string(&outcome)?);
        } else if outcome.initialized() {
            println!("created migration table {}", outcome.table());
        } else {
            println!("migration table {} already exists", outcome.table());
        }
        return Ok(());
    };

    let change = engine
        .run(&mut db, outcome.table(), command)
        .map_err(|e| anyhow!("{} failed: {}", command.name(), e))?;

    if cli.json {
        let output = json!({
            "table": outcome.table().qualified_name(),
            "command": command.name(),
            "old_version": change.old,
            "new_version": change.new,
        });
        println!("{}", output);
    } else {
        println!("{}", change);
    }

    Ok(())
}

fn connect(config: &BootstrapConfig) -> Result<DatabaseConn> {
    match &config.sqlite_path {
        Some(path) => {
            info!("Opening SQLite database {}", path);
            Ok(DatabaseConn::open_sqlite(Some(path))?)
        }
        None => {
            let opts = config.connection_config();
            info!("Connecting to {}", opts.redacted());
            Ok(DatabaseConn::connect_postgres(&opts)?)
        }
    }
}
