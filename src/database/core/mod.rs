//! Core database infrastructure
//!
//! This module provides the foundational database components:
//! - `DatabaseConn`: connection wrapper with query hook support
//! - `Driver`: backend abstraction (SQLite always, PostgreSQL behind the `postgres` feature)
//! - `SqlValue`: untyped parameter and scalar value
//! - `Dialect`: per-backend SQL text

mod connection;
mod dialect;
#[cfg(feature = "postgres")]
mod pg;
mod sqlite;
mod value;

pub use connection::{DatabaseConn, Driver};
pub use dialect::{quote_ident, Dialect};
#[cfg(feature = "postgres")]
pub use pg::PostgresDriver;
pub use sqlite::SqliteDriver;
pub use value::SqlValue;
