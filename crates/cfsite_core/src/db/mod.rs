//! Local backend storage: connection bootstrap and schema provisioning.
//!
//! The local backend mirrors the hosted project's collections in one SQLite
//! file. `PRAGMA user_version` records how far that file has been provisioned,
//! so a file stopped at version 1 behaves like a project that never created
//! `site_content`.
//!
//! # See also
//! - docs/architecture/local-backend.md

use rusqlite::{Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory, open_db_in_memory_at};

pub type DbResult<T> = Result<T, DbError>;

/// Failure while opening or provisioning the local backend.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The file was provisioned by a newer build than this one.
    SchemaAhead { found: u32, supported: u32 },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "local backend error: {err}"),
            Self::SchemaAhead { found, supported } => write!(
                f,
                "local backend is at schema version {found}; this build provisions up to {supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::SchemaAhead { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Schema version the connection has been provisioned to.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?)
}

/// Whether `collection` exists as a table on this connection.
pub fn collection_exists(conn: &Connection, collection: &str) -> DbResult<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1;",
            [collection],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(found.is_some())
}
