use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{NewLedgerEntry, NewProject, PaymentLedgerEntry, Project};

/// The result of an attempt to write a payment ledger entry.
///
/// A uniqueness violation on either the gateway transaction id or the service request id is not an error. It means
/// that another caller has already settled the payment, and the existing entry is returned instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertLedgerResult {
    Inserted(PaymentLedgerEntry),
    AlreadyExists(PaymentLedgerEntry),
}

impl InsertLedgerResult {
    pub fn entry(&self) -> &PaymentLedgerEntry {
        match self {
            Self::Inserted(e) | Self::AlreadyExists(e) => e,
        }
    }

    pub fn into_entry(self) -> PaymentLedgerEntry {
        match self {
            Self::Inserted(e) | Self::AlreadyExists(e) => e,
        }
    }

    pub fn is_inserted(&self) -> bool {
        matches!(self, Self::Inserted(_))
    }
}

/// Everything the store needs to write for a single settlement. All the values have already been derived from the
/// tier policy and gateway transaction, so the store does no business arithmetic of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSettlement {
    pub service_request_id: i64,
    pub ledger_entry: NewLedgerEntry,
    pub project: NewProject,
    pub settled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementOutcome {
    pub project: Project,
    pub ledger_entry: PaymentLedgerEntry,
    /// `false` when another caller had already settled this request.
    pub newly_processed: bool,
}

impl SettlementOutcome {
    pub fn new(project: Project, ledger_entry: PaymentLedgerEntry, newly_processed: bool) -> Self {
        Self { project, ledger_entry, newly_processed }
    }
}
