use thiserror::Error;

use crate::db_types::TierPolicy;

#[derive(Debug, Clone, Error)]
pub enum TierPolicyError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for TierPolicyError {
    fn from(e: sqlx::Error) -> Self {
        TierPolicyError::DatabaseError(e.to_string())
    }
}

/// Read-only access to the commercial terms of the service tiers.
///
/// The values returned are a snapshot. Settlement copies them onto the ledger entry and project, so later edits to a
/// tier never reach records that have already been settled.
#[allow(async_fn_in_trait)]
pub trait TierPolicies {
    async fn fetch_tier_policy(&self, label: &str) -> Result<Option<TierPolicy>, TierPolicyError>;

    /// All tiers, ordered by label.
    async fn fetch_tier_policies(&self) -> Result<Vec<TierPolicy>, TierPolicyError>;
}
