use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use amp_settlement_engine::{GatewayError, ProjectApiError, SettlementError, TierPolicyError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Invalid query. {0}")]
    InvalidQuery(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("The store is temporarily unavailable. {0}")]
    StoreUnavailable(String),
    #[error("{0}")]
    Settlement(#[from] SettlementError),
}

impl ServerError {
    /// Whether the client should try the same request again later. Sent to the client as `retryable`.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::StoreUnavailable(_) => true,
            Self::Settlement(e) => e.is_retryable(),
            _ => false,
        }
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Settlement(e) => settlement_status_code(e),
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string(), "retryable": self.is_retryable() }).to_string())
    }
}

fn settlement_status_code(e: &SettlementError) -> StatusCode {
    match e {
        SettlementError::InvalidTransactionId(_) => StatusCode::BAD_REQUEST,
        SettlementError::RequestNotFound(_) => StatusCode::NOT_FOUND,
        SettlementError::Gateway(GatewayError::TransactionNotFound(_)) => StatusCode::NOT_FOUND,
        SettlementError::Gateway(GatewayError::InvalidResponse(_)) => StatusCode::BAD_GATEWAY,
        e if e.is_retryable() => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<ProjectApiError> for ServerError {
    fn from(e: ProjectApiError) -> Self {
        match e {
            ProjectApiError::DatabaseError(s) => Self::StoreUnavailable(s),
        }
    }
}

impl From<TierPolicyError> for ServerError {
    fn from(e: TierPolicyError) -> Self {
        match e {
            TierPolicyError::DatabaseError(s) => Self::StoreUnavailable(s),
        }
    }
}
