use amp_common::{Cents, DEFAULT_CURRENCY_CODE};
use chrono::{DateTime, Duration, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{
        NewLedgerEntry,
        NewProject,
        NewServiceAssignment,
        PaymentLedgerEntry,
        ProjectCategory,
        ServiceRequest,
        TierPolicy,
    },
    traits::{GatewayPaymentStatus, GatewayTransaction, NewSettlement, SettlementError, TransactionMetadata},
};

const SERVICE_REQUEST_ID_KEYS: [&str; 2] = ["serviceRequestId", "service_request_id"];
const ARTIST_USER_ID_KEYS: [&str; 2] = ["artistUserId", "artist_user_id"];
const CREATOR_ID_KEYS: [&str; 2] = ["creatorId", "creator_id"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementStatus {
    Paid,
    Pending,
    Failed,
}

impl From<GatewayPaymentStatus> for SettlementStatus {
    fn from(value: GatewayPaymentStatus) -> Self {
        match value {
            GatewayPaymentStatus::Completed => Self::Paid,
            GatewayPaymentStatus::Pending => Self::Pending,
            GatewayPaymentStatus::Failed => Self::Failed,
        }
    }
}

/// The summary returned to whoever asked for a transaction to be settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementResult {
    pub status: SettlementStatus,
    pub request_id: Option<i64>,
    pub project_id: Option<i64>,
    pub is_newly_processed: bool,
    /// Set when this transaction is a second completed payment for a request that another transaction already
    /// settled. Holds that other transaction's id. The second payment is not recorded and has to be refunded or
    /// reviewed by hand.
    #[serde(skip)]
    pub duplicate_payment_of: Option<String>,
}

impl SettlementResult {
    pub fn paid(request_id: i64, project_id: i64, is_newly_processed: bool) -> Self {
        Self {
            status: SettlementStatus::Paid,
            request_id: Some(request_id),
            project_id: Some(project_id),
            is_newly_processed,
            duplicate_payment_of: None,
        }
    }

    /// Flags this result if the ledger entry that settled the request belongs to a different transaction.
    pub fn check_duplicate_payment(mut self, transaction_id: &str, recorded: &PaymentLedgerEntry) -> Self {
        if recorded.gateway_transaction_id != transaction_id {
            self.duplicate_payment_of = Some(recorded.gateway_transaction_id.clone());
        }
        self
    }

    /// The transaction has not completed, so nothing was done. The request id is reported if the metadata has one.
    pub fn not_completed(status: GatewayPaymentStatus, request_id: Option<i64>) -> Self {
        Self {
            status: status.into(),
            request_id,
            project_id: None,
            is_newly_processed: false,
            duplicate_payment_of: None,
        }
    }
}

/// The metadata that was attached to the checkout session when it was created, decoded into something we can trust.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementMetadata {
    pub service_request_id: i64,
    pub artist_user_id: Option<String>,
    pub creator_id: Option<String>,
}

impl SettlementMetadata {
    /// A lenient read of the service request id, for reporting on transactions that have not completed.
    pub fn peek_request_id(metadata: &TransactionMetadata) -> Option<i64> {
        metadata.first_of(&SERVICE_REQUEST_ID_KEYS).and_then(|s| s.parse().ok())
    }
}

impl TryFrom<&TransactionMetadata> for SettlementMetadata {
    type Error = SettlementError;

    fn try_from(metadata: &TransactionMetadata) -> Result<Self, Self::Error> {
        let raw_id = metadata
            .first_of(&SERVICE_REQUEST_ID_KEYS)
            .ok_or_else(|| SettlementError::MissingMetadata("serviceRequestId".into()))?;
        let service_request_id = raw_id
            .parse::<i64>()
            .map_err(|_| SettlementError::MissingMetadata(format!("serviceRequestId is not a valid id ({raw_id})")))?;
        let artist_user_id = metadata.first_of(&ARTIST_USER_ID_KEYS).map(String::from);
        let creator_id = metadata.first_of(&CREATOR_ID_KEYS).map(String::from);
        Ok(Self { service_request_id, artist_user_id, creator_id })
    }
}

/// `round(total * commission_percentage / 100)`, rounding halves away from zero.
pub fn platform_fee(total: Cents, commission_percentage: f64) -> Cents {
    total.percentage(commission_percentage)
}

/// The commercial terms of a settlement, fixed at the moment of settlement from the tier policy and the amount the
/// gateway actually collected.
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementTerms {
    pub total_amount: Cents,
    pub platform_fee: Cents,
    pub creator_amount: Cents,
    pub currency: String,
    pub commission_percentage: f64,
    pub revision_limit: i64,
    pub stems_included: bool,
    pub delivery_deadline: DateTime<Utc>,
}

impl SettlementTerms {
    pub fn derive(
        tier: &TierPolicy,
        transaction: &GatewayTransaction,
        now: DateTime<Utc>,
    ) -> Result<Self, SettlementError> {
        let total_amount =
            transaction.amount_total.ok_or_else(|| SettlementError::MissingMetadata("amountTotal".into()))?;
        if total_amount.is_negative() {
            return Err(SettlementError::MissingMetadata(format!("amountTotal is negative ({total_amount})")));
        }
        let currency = match transaction.currency.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            Some(c) => c.to_ascii_uppercase(),
            None => {
                warn!(
                    "💸️ Transaction {} has no currency. Assuming {DEFAULT_CURRENCY_CODE}.",
                    transaction.transaction_id
                );
                DEFAULT_CURRENCY_CODE.to_string()
            },
        };
        let delivery_deadline = Duration::try_days(tier.delivery_days)
            .filter(|_| tier.delivery_days >= 0)
            .and_then(|days| now.checked_add_signed(days))
            .ok_or_else(|| {
                SettlementError::InvalidPolicy(format!(
                    "tier '{}' has an unusable delivery time of {} days",
                    tier.label, tier.delivery_days
                ))
            })?;
        let platform_fee = platform_fee(total_amount, tier.commission_percentage);
        // by subtraction, so that the two parts always add up to the total
        let creator_amount = total_amount - platform_fee;
        Ok(Self {
            total_amount,
            platform_fee,
            creator_amount,
            currency,
            commission_percentage: tier.commission_percentage,
            revision_limit: tier.number_of_revisions,
            stems_included: tier.stems_allowance > 0,
            delivery_deadline,
        })
    }

    /// Assembles everything the store has to write for this settlement.
    ///
    /// The payment reference falls back to the transaction id when the gateway did not supply one.
    pub fn into_settlement(
        self,
        request: &ServiceRequest,
        transaction: &GatewayTransaction,
        creator_id: Option<String>,
        now: DateTime<Utc>,
    ) -> NewSettlement {
        let payment_reference_id =
            transaction.payment_reference_id.clone().unwrap_or_else(|| transaction.transaction_id.clone());
        let category = ProjectCategory::from(&request.service_category);
        let ledger_entry = NewLedgerEntry {
            service_request_id: request.id,
            gateway_transaction_id: transaction.transaction_id.clone(),
            payment_reference_id,
            total_amount: self.total_amount,
            platform_fee: self.platform_fee,
            creator_amount: self.creator_amount,
            currency: self.currency,
            created_at: now,
        };
        let project = NewProject {
            owner_artist_id: request.owner_artist_id.clone(),
            source_service_request_id: request.id,
            project_name: request.project_name.clone(),
            artist_name: request.artist_name.clone(),
            project_type: category,
            tier_label: request.tier_label.clone(),
            technical: request.technical.clone(),
            revision_limit: self.revision_limit,
            delivery_deadline: self.delivery_deadline,
            stems_included: self.stems_included,
            created_at: now,
            assignment: NewServiceAssignment { category, creator_id },
        };
        NewSettlement { service_request_id: request.id, ledger_entry, project, settled_at: now }
    }
}
