//! SQLite backend for the settlement engine.
//!
//! [`SqliteDatabase`] implements the backend traits. The free functions in [`db`] do the actual SQL work and can be
//! composed inside a transaction.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
