//! # Settlement engine public API
//!
//! * [`settlement_flow_api`] turns a confirmed gateway payment into a funded project. This is the only part of the
//!   engine that writes.
//! * [`projects_api`] provides read-only queries over the projects, ledger entries and tier policies that settlement
//!   uses and produces.
//!
//! The other submodules in this module are support types and pure functions.
//!
//! # API usage
//!
//! An API instance is created by supplying a database backend that implements the backend traits the API needs, and
//! for settlement, a payment gateway:
//!
//! ```rust,ignore
//! use amp_settlement_engine::{events::EventProducers, SettlementApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/amp_store.db", 25).await?;
//! let api = SettlementApi::new(db, my_gateway, EventProducers::default());
//! let result = api.settle("cs_test_a1b2c3").await?;
//! ```
pub mod projects_api;
pub mod settlement_flow_api;
pub mod settlement_objects;
