//! # SQLite backend
//!
//! The submodules hold "low-level" SQLite interactions as plain functions that accept a `&mut SqliteConnection`.
//! Callers obtain a connection from the pool, or open a transaction and pass it through, without any other changes.
//! [`SqliteDatabase`] composes these functions into the backend traits.
use std::{env, str::FromStr, time::Duration};

use log::*;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod games;
pub mod orders;
pub mod reviews;
mod sqlite_impl;
mod transaction_inventory;

pub use sqlite_impl::SqliteDatabase;
pub use transaction_inventory::TransactionInventory;

const SQLITE_DB_URL: &str = "sqlite://data/game_store.db";
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

pub fn db_url() -> String {
    let result = env::var("GSS_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ GSS_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

/// Opens a connection pool, creating the database file if needed.
///
/// Connections run in WAL mode with a busy timeout, so concurrent writers queue on SQLite's write lock instead of
/// failing immediately with `SQLITE_BUSY`.
pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
