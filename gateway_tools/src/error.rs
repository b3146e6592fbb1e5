use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckoutApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid checkout session id: {0}")]
    InvalidSessionId(String),
    #[error("Could not reach the gateway: {0}")]
    RestRequestError(String),
    #[error("The gateway did not respond in time")]
    Timeout,
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Checkout session {0} does not exist")]
    SessionNotFound(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
}

impl CheckoutApiError {
    /// Whether repeating the same request later could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RestRequestError(_) | Self::Timeout => true,
            Self::QueryError { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for CheckoutApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::JsonError(e.to_string())
        } else {
            Self::RestRequestError(e.to_string())
        }
    }
}
