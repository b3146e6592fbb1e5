use thiserror::Error;

use crate::db_types::{PaymentLedgerEntry, Project, ServiceAssignment, ServiceRequest};

#[derive(Debug, Clone, Error)]
pub enum ProjectApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for ProjectApiError {
    fn from(e: sqlx::Error) -> Self {
        ProjectApiError::DatabaseError(e.to_string())
    }
}

/// Read-only queries over service requests and the records that settlement produces from them.
///
/// Nothing here writes to the store. Writes happen only through
/// [`crate::traits::SettlementDatabase::materialize_project`].
#[allow(async_fn_in_trait)]
pub trait ProjectManagement {
    async fn fetch_service_request(&self, request_id: i64) -> Result<Option<ServiceRequest>, ProjectApiError>;

    /// The genre ids linked to the service request, in ascending order.
    async fn fetch_service_request_genres(&self, request_id: i64) -> Result<Vec<i64>, ProjectApiError>;

    /// Fetches the project that was created from the given service request, if it has been settled.
    ///
    /// Projects are matched strictly on their source service request.
    async fn fetch_project_for_request(&self, request_id: i64) -> Result<Option<Project>, ProjectApiError>;

    async fn fetch_project(&self, project_id: i64) -> Result<Option<Project>, ProjectApiError>;

    /// The genre ids copied onto the project, in ascending order.
    async fn fetch_project_genres(&self, project_id: i64) -> Result<Vec<i64>, ProjectApiError>;

    async fn fetch_service_assignment(&self, project_id: i64) -> Result<Option<ServiceAssignment>, ProjectApiError>;

    async fn fetch_ledger_entry_for_request(
        &self,
        request_id: i64,
    ) -> Result<Option<PaymentLedgerEntry>, ProjectApiError>;

    async fn fetch_ledger_entry_for_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Option<PaymentLedgerEntry>, ProjectApiError>;
}
