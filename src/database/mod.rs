//! Database module
//!
//! ```text
//! database/
//! ├── core/           # Foundation
//! │   ├── connection  # DatabaseConn wrapper + Driver trait
//! │   ├── sqlite      # rusqlite driver
//! │   ├── pg          # postgres driver (feature "postgres")
//! │   ├── dialect     # SQL differences between backends
//! │   └── value       # SqlValue
//! ├── observer        # Query hooks and the query logger
//! └── error           # DbError, QueryFormatError
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use migrate_bootstrap::database::{DatabaseConn, QueryLogger};
//!
//! let mut db = DatabaseConn::open_in_memory()?
//!     .with_hook(Arc::new(QueryLogger::tracing()));
//! db.execute("CREATE TABLE t (id INTEGER)", &[])?;
//! ```

pub mod core;
pub mod error;
pub mod observer;

pub use core::{quote_ident, DatabaseConn, Dialect, Driver, SqlValue, SqliteDriver};

#[cfg(feature = "postgres")]
pub use core::PostgresDriver;

pub use error::{DbError, QueryFormatError};
pub use observer::{QueryEvent, QueryHook, QueryLogger, QUERY_UNAVAILABLE};
