use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
        RwLock,
    },
    time::Duration,
};

use amp_common::Cents;

use crate::traits::{GatewayError, GatewayPaymentStatus, GatewayTransaction, PaymentGateway, TransactionMetadata};

/// An in-memory payment gateway. Transactions are registered up front and can be changed at any time, e.g. to move a
/// transaction from pending to completed between two settlement calls.
#[derive(Debug, Clone, Default)]
pub struct MockGateway {
    transactions: Arc<RwLock<HashMap<String, GatewayTransaction>>>,
    failure: Arc<RwLock<Option<GatewayError>>>,
    calls: Arc<AtomicUsize>,
    latency: Option<Duration>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every lookup waits this long before answering, so that concurrent settlements of the same transaction
    /// actually interleave.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn add_transaction(&self, transaction: GatewayTransaction) {
        let mut transactions = self.transactions.write().expect("Gateway lock poisoned");
        transactions.insert(transaction.transaction_id.clone(), transaction);
    }

    pub fn set_status(&self, transaction_id: &str, status: GatewayPaymentStatus) {
        let mut transactions = self.transactions.write().expect("Gateway lock poisoned");
        if let Some(tx) = transactions.get_mut(transaction_id) {
            tx.payment_status = status;
        }
    }

    /// Every call fails with `error` until this is called again with `None`.
    pub fn set_failure(&self, error: Option<GatewayError>) {
        *self.failure.write().expect("Gateway lock poisoned") = error;
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PaymentGateway for MockGateway {
    async fn retrieve_transaction(&self, transaction_id: &str) -> Result<GatewayTransaction, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if let Some(e) = self.failure.read().expect("Gateway lock poisoned").clone() {
            return Err(e);
        }
        let transactions = self.transactions.read().expect("Gateway lock poisoned");
        transactions.get(transaction_id).cloned().ok_or_else(|| GatewayError::TransactionNotFound(transaction_id.into()))
    }
}

/// A checkout for the given service request, as the gateway reports it once it has been paid.
pub fn completed_transaction(txid: &str, request_id: i64, artist: &str, amount: i64) -> GatewayTransaction {
    transaction_with_status(txid, request_id, artist, amount, GatewayPaymentStatus::Completed)
}

pub fn transaction_with_status(
    txid: &str,
    request_id: i64,
    artist: &str,
    amount: i64,
    status: GatewayPaymentStatus,
) -> GatewayTransaction {
    let metadata =
        TransactionMetadata::new().with("serviceRequestId", &request_id.to_string()).with("artistUserId", artist);
    GatewayTransaction::new(txid, status)
        .with_amount(Cents::from(amount), "usd")
        .with_payment_reference(&format!("pi_{txid}"))
        .with_metadata(metadata)
}
