use amp_common::{Cents, DEFAULT_CURRENCY_CODE};
use amp_settlement_engine::{
    GatewayError,
    GatewayPaymentStatus,
    GatewayTransaction,
    PaymentGateway,
    TransactionMetadata,
};
use gateway_tools::{helpers::normalize_currency, CheckoutApi, CheckoutApiError, CheckoutConfig, CheckoutSession};
use log::*;

/// Adapts the checkout gateway's REST client to the settlement engine's [`PaymentGateway`] contract.
#[derive(Clone)]
pub struct CheckoutGateway {
    api: CheckoutApi,
}

impl CheckoutGateway {
    pub fn new(config: CheckoutConfig) -> Result<Self, CheckoutApiError> {
        let api = CheckoutApi::new(config)?;
        Ok(Self { api })
    }
}

impl PaymentGateway for CheckoutGateway {
    async fn retrieve_transaction(&self, transaction_id: &str) -> Result<GatewayTransaction, GatewayError> {
        let session = self.api.get_session(transaction_id).await.map_err(|e| {
            debug!("🌐️ Could not retrieve checkout session {transaction_id}. {e}");
            gateway_error(transaction_id, e)
        })?;
        Ok(transaction_from_session(session))
    }
}

/// Maps the gateway's payment status onto the three states settlement cares about.
///
/// A session that is still `unpaid` but has expired will never be paid, so it counts as failed.
pub fn payment_status(session: &CheckoutSession) -> GatewayPaymentStatus {
    let expired = session.status.as_deref().map(|s| s.eq_ignore_ascii_case("expired")).unwrap_or(false);
    match session.payment_status.to_ascii_lowercase().as_str() {
        "paid" | "no_payment_required" | "complete" | "completed" | "succeeded" => GatewayPaymentStatus::Completed,
        "unpaid" | "open" | "pending" | "processing" if !expired => GatewayPaymentStatus::Pending,
        _ => GatewayPaymentStatus::Failed,
    }
}

pub fn transaction_from_session(session: CheckoutSession) -> GatewayTransaction {
    let status = payment_status(&session);
    let mut tx = GatewayTransaction::new(&session.id, status);
    if let Some(amount) = session.amount_total {
        let currency = session.currency.as_deref().map(normalize_currency).unwrap_or_else(|| {
            warn!("🌐️ Checkout session {} has no currency. Assuming {DEFAULT_CURRENCY_CODE}", session.id);
            DEFAULT_CURRENCY_CODE.to_string()
        });
        tx = tx.with_amount(Cents::from(amount), &currency);
    }
    if let Some(reference) = session.payment_reference_id() {
        tx = tx.with_payment_reference(reference);
    }
    tx.with_metadata(TransactionMetadata::from(session.metadata))
}

fn gateway_error(transaction_id: &str, e: CheckoutApiError) -> GatewayError {
    match e {
        CheckoutApiError::SessionNotFound(_) | CheckoutApiError::InvalidSessionId(_) => {
            GatewayError::TransactionNotFound(transaction_id.to_string())
        },
        CheckoutApiError::Timeout => GatewayError::Timeout,
        e if e.is_transient() => GatewayError::Unreachable(e.to_string()),
        e => GatewayError::InvalidResponse(e.to_string()),
    }
}
