use serde::{Deserialize, Serialize};

use crate::db_types::{PaymentLedgerEntry, Project};

/// Published once per service request, after the settlement that created the project has been committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFundedEvent {
    pub project: Project,
    pub ledger_entry: PaymentLedgerEntry,
}

impl ProjectFundedEvent {
    pub fn new(project: Project, ledger_entry: PaymentLedgerEntry) -> Self {
        Self { project, ledger_entry }
    }
}
