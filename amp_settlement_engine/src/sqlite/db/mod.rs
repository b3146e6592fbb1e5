//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interaction are maintained by simple functions (rather than stateful structs) that accept a
//! `&mut SqliteConnection` argument. Callers can obtain a connection from a pool,
//! or create an atomic transaction as the need arises and call through to the functions without any other changes.
use std::{env, str::FromStr, time::Duration};

use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod genres;
pub mod ledger;
pub mod projects;
pub mod service_requests;
pub mod tier_policies;

const SQLITE_DB_URL: &str = "sqlite://data/amp_store.db";
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5_000);

pub fn db_url() -> String {
    let result = env::var("AMP_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ AMP_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

/// Creates a new connection pool. The database file is created if it does not exist yet.
///
/// Connections run in WAL mode, and wait up to `busy_timeout` for the write lock rather than failing immediately with
/// `SQLITE_BUSY` when another settlement holds it.
pub async fn new_pool(url: &str, max_connections: u32, busy_timeout: Duration) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(busy_timeout);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
