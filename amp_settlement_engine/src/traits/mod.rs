//! # Backend contracts
//!
//! This module defines the interfaces that settlement backends and payment gateways must provide.
//!
//! ## Store
//! The [`SettlementDatabase`] trait is the highest level of behaviour for a store backing the settlement engine. Its
//! single writing operation, [`SettlementDatabase::materialize_project`], performs the whole unit of work of a
//! settlement atomically: the service request is marked as paid, the payment ledger entry is written and the project
//! is created along with its genre links and service assignment.
//!
//! * [`ProjectManagement`] provides read-only queries over service requests, projects and the payment ledger.
//! * [`TierPolicies`] provides read-only access to the commercial terms of each service tier.
//!
//! ## Gateway
//! [`PaymentGateway`] abstracts the external checkout provider. The engine only ever reads from the gateway, so calls
//! are always safe to retry.
mod data_objects;
mod payment_gateway;
mod project_management;
mod settlement_database;
mod tier_policies;

pub use data_objects::{InsertLedgerResult, NewSettlement, SettlementOutcome};
pub use payment_gateway::{GatewayError, GatewayPaymentStatus, GatewayTransaction, PaymentGateway, TransactionMetadata};
pub use project_management::{ProjectApiError, ProjectManagement};
pub use settlement_database::{SettlementDatabase, SettlementError};
pub use tier_policies::{TierPolicies, TierPolicyError};
