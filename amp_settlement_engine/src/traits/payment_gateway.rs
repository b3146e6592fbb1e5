use std::collections::HashMap;

use amp_common::Cents;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("The payment gateway could not be reached: {0}")]
    Unreachable(String),
    #[error("The payment gateway did not respond in time")]
    Timeout,
    #[error("The payment gateway has no record of transaction {0}")]
    TransactionNotFound(String),
    #[error("The payment gateway sent a response we could not understand: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// Gateway reads have no side effects, so these are always safe to retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unreachable(_) | Self::Timeout)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayPaymentStatus {
    Completed,
    Pending,
    Failed,
}

/// Free-form key/value metadata that was attached to the checkout when it was created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionMetadata(HashMap<String, String>);

impl TransactionMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.0.insert(key.to_string(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Returns the first non-blank value found under any of the given keys.
    pub fn first_of(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().filter_map(|k| self.get(k)).map(str::trim).find(|v| !v.is_empty())
    }
}

impl From<HashMap<String, String>> for TransactionMetadata {
    fn from(value: HashMap<String, String>) -> Self {
        Self(value)
    }
}

/// The engine's view of a checkout transaction held by the payment gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayTransaction {
    pub transaction_id: String,
    pub payment_status: GatewayPaymentStatus,
    pub amount_total: Option<Cents>,
    pub currency: Option<String>,
    pub payment_reference_id: Option<String>,
    pub metadata: TransactionMetadata,
}

impl GatewayTransaction {
    pub fn new(transaction_id: &str, payment_status: GatewayPaymentStatus) -> Self {
        Self {
            transaction_id: transaction_id.to_string(),
            payment_status,
            amount_total: None,
            currency: None,
            payment_reference_id: None,
            metadata: TransactionMetadata::default(),
        }
    }

    pub fn with_amount(mut self, amount: Cents, currency: &str) -> Self {
        self.amount_total = Some(amount);
        self.currency = Some(currency.to_string());
        self
    }

    pub fn with_payment_reference(mut self, reference: &str) -> Self {
        self.payment_reference_id = Some(reference.to_string());
        self
    }

    pub fn with_metadata(mut self, metadata: TransactionMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn is_completed(&self) -> bool {
        self.payment_status == GatewayPaymentStatus::Completed
    }
}

/// An external payment provider from which checkout transactions can be retrieved.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    /// Fetches the current state of the transaction with the given id. This call must not have side effects.
    async fn retrieve_transaction(&self, transaction_id: &str) -> Result<GatewayTransaction, GatewayError>;
}
