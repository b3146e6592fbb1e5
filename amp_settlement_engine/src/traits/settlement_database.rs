use sqlx::error::ErrorKind;
use thiserror::Error;

use crate::traits::{
    data_objects::{NewSettlement, SettlementOutcome},
    GatewayError,
    ProjectApiError,
    ProjectManagement,
    TierPolicies,
    TierPolicyError,
};

/// This trait defines the highest level of behaviour for backends supporting the settlement engine.
///
/// Implementations must provide store-level uniqueness on the ledger's gateway transaction id and service request id,
/// and on the project's source service request id. The application-level existence checks that the engine performs
/// are an optimisation only; the constraints are what make settlement safe under concurrency.
#[allow(async_fn_in_trait)]
pub trait SettlementDatabase: Clone + ProjectManagement + TierPolicies {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Performs the write side of a settlement in a single atomic transaction:
    /// * The service request is moved to `Paid`, unless it is already at `Paid` or beyond.
    /// * The payment ledger entry is inserted. If an entry already exists for the transaction or the request, the
    ///   existing entry is used.
    /// * If no project exists for the request yet, it is created, the request's genre links are copied onto it and
    ///   its service assignment is created.
    ///
    /// If the request has been cancelled, nothing is written and [`SettlementError::RequestCancelled`] is returned.
    ///
    /// The outcome's `newly_processed` flag is `true` only for the caller whose transaction created the project.
    async fn materialize_project(&self, settlement: NewSettlement) -> Result<SettlementOutcome, SettlementError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), SettlementError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum SettlementError {
    #[error("Payment gateway error. {0}")]
    Gateway(#[from] GatewayError),
    #[error("The settlement store failed: {0}")]
    DatabaseError(String),
    #[error("The gateway transaction id is empty or malformed: {0}")]
    InvalidTransactionId(String),
    #[error("The completed transaction is missing required metadata: {0}")]
    MissingMetadata(String),
    #[error("Service request #{0} does not exist")]
    RequestNotFound(i64),
    #[error("No tier policy exists for tier '{0}'")]
    PolicyMissing(String),
    #[error("The tier policy cannot be applied: {0}")]
    InvalidPolicy(String),
    #[error("The settlement store rejected the data: {0}")]
    IntegrityError(String),
    #[error("Service request #{request_id} was cancelled, but payment {payment_reference} was completed for it")]
    RequestCancelled { request_id: i64, payment_reference: String },
    #[error("A project already exists for service request #{0}")]
    ProjectAlreadyExists(i64),
}

impl SettlementError {
    /// Data integrity failures. Retrying will not help; somebody has to look at the data.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::MissingMetadata(_)
                | Self::RequestNotFound(_)
                | Self::PolicyMissing(_)
                | Self::InvalidPolicy(_)
                | Self::IntegrityError(_)
                | Self::RequestCancelled { .. }
        )
    }

    /// Failures where nothing was written and the same call may succeed later.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Gateway(e) => e.is_transient(),
            Self::DatabaseError(_) => true,
            _ => false,
        }
    }
}

/// Constraint violations and rows that can't be decoded fail the same way every time, so they are not retryable.
impl From<sqlx::Error> for SettlementError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(err)
                if matches!(
                    err.kind(),
                    ErrorKind::UniqueViolation
                        | ErrorKind::ForeignKeyViolation
                        | ErrorKind::NotNullViolation
                        | ErrorKind::CheckViolation
                ) =>
            {
                SettlementError::IntegrityError(e.to_string())
            },
            sqlx::Error::Decode(_)
            | sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::TypeNotFound { .. } => SettlementError::IntegrityError(e.to_string()),
            _ => SettlementError::DatabaseError(e.to_string()),
        }
    }
}

impl From<ProjectApiError> for SettlementError {
    fn from(e: ProjectApiError) -> Self {
        match e {
            ProjectApiError::DatabaseError(s) => SettlementError::DatabaseError(s),
        }
    }
}

impl From<TierPolicyError> for SettlementError {
    fn from(e: TierPolicyError) -> Self {
        match e {
            TierPolicyError::DatabaseError(s) => SettlementError::DatabaseError(s),
        }
    }
}
