//! Migration engine boundary
//!
//! The engine owns the tracking table and executes migration commands. The
//! bootstrap only needs `init`; the rest of the command vocabulary is parsed
//! here so callers can hand any command to whichever engine they plug in.

use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

use crate::database::{quote_ident, DatabaseConn, DbError, Dialect, SqlValue};
use crate::migration::MigrationTable;

pub const MIGRATION_USAGE_TEXT: &str = "\
This program runs command on the db. Supported commands are:
  - init - creates the migration tracking table.
  - up - runs all available migrations.
  - up [target] - runs available migrations up to the target one.
  - down - reverts last migration.
  - reset - reverts all migrations.
  - version - prints current db version.
  - set_version [version] - sets db version without running migrations.
";

/// Errors raised by migration engines
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("unsupported command: {0}")]
    UnknownCommand(String),

    #[error("command '{command}' requires argument <{argument}>")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("invalid version '{0}'")]
    InvalidVersion(String),

    /// The command needs migration scripts, which this engine does not run.
    #[error("command '{0}' is not supported by this engine")]
    Unsupported(&'static str),

    #[error(transparent)]
    Database(#[from] DbError),
}

/// A command understood by migration engines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationCommand {
    Init,
    Up { target: Option<i64> },
    Down,
    Reset,
    Version,
    SetVersion(i64),
}

impl MigrationCommand {
    /// Parse a command name and its arguments
    pub fn parse<S: AsRef<str>>(command: &str, args: &[S]) -> Result<Self, MigrationError> {
        let first = args.first().map(|a| a.as_ref());
        match command {
            "init" => Ok(MigrationCommand::Init),
            "up" => Ok(MigrationCommand::Up {
                target: first.map(parse_version).transpose()?,
            }),
            "down" => Ok(MigrationCommand::Down),
            "reset" => Ok(MigrationCommand::Reset),
            "version" => Ok(MigrationCommand::Version),
            "set_version" => {
                let version = first.ok_or(MigrationError::MissingArgument {
                    command: "set_version",
                    argument: "version",
                })?;
                Ok(MigrationCommand::SetVersion(parse_version(version)?))
            }
            other => Err(MigrationError::UnknownCommand(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MigrationCommand::Init => "init",
            MigrationCommand::Up { .. } => "up",
            MigrationCommand::Down => "down",
            MigrationCommand::Reset => "reset",
            MigrationCommand::Version => "version",
            MigrationCommand::SetVersion(_) => "set_version",
        }
    }
}

fn parse_version(s: &str) -> Result<i64, MigrationError> {
    s.parse()
        .map_err(|_| MigrationError::InvalidVersion(s.to_string()))
}

/// Database version before and after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VersionChange {
    pub old: i64,
    pub new: i64,
}

impl VersionChange {
    pub fn unchanged(version: i64) -> Self {
        Self {
            old: version,
            new: version,
        }
    }

    pub fn is_change(&self) -> bool {
        self.old != self.new
    }
}

impl fmt::Display for VersionChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_change() {
            write!(f, "migrated from version {} to {}", self.old, self.new)
        } else {
            write!(f, "version is {}", self.new)
        }
    }
}

/// Executes migration commands against one tracking table
///
/// The tracking table is always passed explicitly, so two schemas can be
/// migrated from the same process without stepping on each other.
pub trait MigrationEngine {
    fn run(
        &self,
        db: &mut DatabaseConn,
        table: &MigrationTable,
        command: MigrationCommand,
    ) -> Result<VersionChange, MigrationError>;

    /// Parse `command` and `args`, then run the command
    fn run_command(
        &self,
        db: &mut DatabaseConn,
        table: &MigrationTable,
        command: &str,
        args: &[&str],
    ) -> Result<VersionChange, MigrationError> {
        self.run(db, table, MigrationCommand::parse(command, args)?)
    }
}

/// Engine that maintains the tracking table itself
///
/// Supports `init`, `version` and `set_version`. Commands that apply or
/// revert migration scripts fail with [`MigrationError::Unsupported`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackingTableEngine;

impl TrackingTableEngine {
    pub fn new() -> Self {
        Self
    }

    /// Create the schema (where the backend supports it) and the tracking table
    pub fn init(&self, db: &mut DatabaseConn, table: &MigrationTable) -> Result<(), DbError> {
        let dialect = db.dialect();

        if dialect.supports_create_schema() {
            let sql = format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(table.schema()));
            db.execute(&sql, &[])?;
        }

        let sql = match dialect {
            Dialect::Postgres => format!(
                "CREATE TABLE IF NOT EXISTS {} (\
                 id serial, \
                 version bigint, \
                 created_at timestamptz\
                 )",
                table.quoted()
            ),
            Dialect::Sqlite => format!(
                "CREATE TABLE IF NOT EXISTS {} (\
                 id INTEGER PRIMARY KEY AUTOINCREMENT, \
                 version INTEGER NOT NULL, \
                 created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))\
                 )",
                table.quoted()
            ),
        };
        db.execute(&sql, &[])?;

        info!("Created migration table {}", table);
        Ok(())
    }

    /// Latest recorded version, 0 when nothing has been recorded
    pub fn current_version(
        &self,
        db: &mut DatabaseConn,
        table: &MigrationTable,
    ) -> Result<i64, DbError> {
        let sql = format!("SELECT version FROM {} ORDER BY id DESC LIMIT 1", table.quoted());

        match db.query_value(&sql, &[])? {
            None | Some(SqlValue::Null) => Ok(0),
            Some(v) => v.as_i64().ok_or_else(|| DbError::UnexpectedValue {
                context: format!("version in {}", table),
                value: v.to_string(),
            }),
        }
    }

    /// Record `version` as the current version
    pub fn set_version(
        &self,
        db: &mut DatabaseConn,
        table: &MigrationTable,
        version: i64,
    ) -> Result<(), DbError> {
        let dialect = db.dialect();
        let sql = match dialect {
            Dialect::Postgres => format!(
                "INSERT INTO {} (version, created_at) VALUES ({}, now())",
                table.quoted(),
                dialect.placeholder(1)
            ),
            Dialect::Sqlite => format!(
                "INSERT INTO {} (version) VALUES ({})",
                table.quoted(),
                dialect.placeholder(1)
            ),
        };
        db.execute(&sql, &[SqlValue::Int(version)])?;
        Ok(())
    }
}

impl MigrationEngine for TrackingTableEngine {
    fn run(
        &self,
        db: &mut DatabaseConn,
        table: &MigrationTable,
        command: MigrationCommand,
    ) -> Result<VersionChange, MigrationError> {
        debug!("Running migration command '{}' on {}", command.name(), table);

        match command {
            MigrationCommand::Init => {
                self.init(db, table)?;
                Ok(VersionChange::unchanged(0))
            }
            MigrationCommand::Version => {
                Ok(VersionChange::unchanged(self.current_version(db, table)?))
            }
            MigrationCommand::SetVersion(version) => {
                let old = self.current_version(db, table)?;
                self.set_version(db, table, version)?;
                Ok(VersionChange { old, new: version })
            }
            MigrationCommand::Up { .. } | MigrationCommand::Down | MigrationCommand::Reset => {
                Err(MigrationError::Unsupported(command.name()))
            }
        }
    }
}
