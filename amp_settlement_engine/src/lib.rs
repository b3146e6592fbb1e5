//! Audio Marketplace Settlement Engine
//!
//! Artists request audio production services (mixing, mastering, recording) from creators under tiered service
//! agreements. Once the artist has paid at the external payment gateway, this engine turns the pending service request
//! into a funded project with the right commercial terms: platform fee and creator payout, revision limit, delivery
//! deadline, stems, genres and the creator assignment.
//!
//! Settlement is idempotent. Gateway callbacks, page reloads and retries may all ask for the same transaction to be
//! settled, concurrently, and exactly one project and one payment ledger entry result.
//!
//! The library is divided into these sections:
//! 1. The backend contracts ([`mod@traits`]) and the SQLite backend that implements them ([`SqliteDatabase`]). The
//!    data types stored in the database are defined in [`mod@db_types`] and are public.
//! 2. The public API ([`mod@settlement_api`]). [`SettlementApi`] performs settlement; [`ProjectsApi`] answers read-only
//!    queries about the results.
//!
//! The engine also publishes a [`events::ProjectFundedEvent`] whenever a project is newly funded. A simple hook
//! system lets you subscribe to these and act on them.
pub mod db_types;
pub mod events;
pub mod settlement_api;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use settlement_api::{
    projects_api::{ProjectDetail, ProjectsApi},
    settlement_flow_api::{SettlementApi, FATAL_LOG_TARGET},
    settlement_objects::{platform_fee, SettlementMetadata, SettlementResult, SettlementStatus, SettlementTerms},
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    GatewayError,
    GatewayPaymentStatus,
    GatewayTransaction,
    InsertLedgerResult,
    PaymentGateway,
    ProjectApiError,
    ProjectManagement,
    SettlementDatabase,
    SettlementError,
    TierPolicies,
    TierPolicyError,
    TransactionMetadata,
};
