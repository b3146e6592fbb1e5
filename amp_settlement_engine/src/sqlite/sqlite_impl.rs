//! `SqliteDatabase` is a concrete implementation of a settlement engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::{fmt::Debug, time::Duration};

use log::*;
use sqlx::{migrate::MigrateError, SqlitePool};

use super::db::{db_url, genres, ledger, new_pool, projects, service_requests, tier_policies, DEFAULT_BUSY_TIMEOUT};
use crate::{
    db_types::{PaymentLedgerEntry, Project, ServiceAssignment, ServiceRequest, ServiceRequestStatus, TierPolicy},
    traits::{
        NewSettlement,
        ProjectApiError,
        ProjectManagement,
        SettlementDatabase,
        SettlementError,
        SettlementOutcome,
        TierPolicies,
        TierPolicyError,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SettlementDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn materialize_project(&self, settlement: NewSettlement) -> Result<SettlementOutcome, SettlementError> {
        let NewSettlement { service_request_id: request_id, ledger_entry, project, settled_at } = settlement;
        let mut tx = self.pool.begin().await?;
        // The first statement must be a write so that this transaction holds the write lock before it reads anything.
        let marked = service_requests::mark_paid(request_id, settled_at, &mut tx).await?;
        if marked.is_none() {
            let current = service_requests::fetch_service_request(request_id, &mut tx)
                .await?
                .ok_or(SettlementError::RequestNotFound(request_id))?;
            if current.status == ServiceRequestStatus::Cancelled {
                tx.rollback().await?;
                return Err(SettlementError::RequestCancelled {
                    request_id,
                    payment_reference: ledger_entry.payment_reference_id,
                });
            }
            trace!("🗃️ Service request #{request_id} is already {}. Status left unchanged.", current.status);
        }
        let ledger_result = ledger::idempotent_insert(ledger_entry, &mut tx).await?;
        if let Some(existing) = projects::fetch_project_for_request(request_id, &mut tx).await? {
            debug!("🗃️ Project #{} already exists for service request #{request_id}", existing.id);
            tx.rollback().await?;
            return Ok(SettlementOutcome::new(existing, ledger_result.into_entry(), false));
        }
        let assignment = project.assignment.clone();
        let project = match projects::insert_project(project, &mut tx).await {
            Ok(p) => p,
            Err(SettlementError::ProjectAlreadyExists(_)) => {
                tx.rollback().await?;
                let mut conn = self.pool.acquire().await?;
                let existing = projects::fetch_project_for_request(request_id, &mut conn)
                    .await?
                    .ok_or(SettlementError::ProjectAlreadyExists(request_id))?;
                return Ok(SettlementOutcome::new(existing, ledger_result.into_entry(), false));
            },
            Err(e) => return Err(e),
        };
        let links = genres::copy_request_genres_to_project(request_id, project.id, &mut tx).await?;
        let assignment = projects::insert_assignment(project.id, assignment, &mut tx).await?;
        tx.commit().await?;
        debug!(
            "🗃️ Service request #{request_id} settled. Project #{} created with {links} genre links and a {} \
             assignment",
            project.id, assignment.category
        );
        Ok(SettlementOutcome::new(project, ledger_result.into_entry(), true))
    }

    async fn close(&mut self) -> Result<(), SettlementError> {
        self.pool.close().await;
        Ok(())
    }
}

impl ProjectManagement for SqliteDatabase {
    async fn fetch_service_request(&self, request_id: i64) -> Result<Option<ServiceRequest>, ProjectApiError> {
        let mut conn = self.pool.acquire().await?;
        let request = service_requests::fetch_service_request(request_id, &mut conn).await?;
        Ok(request)
    }

    async fn fetch_service_request_genres(&self, request_id: i64) -> Result<Vec<i64>, ProjectApiError> {
        let mut conn = self.pool.acquire().await?;
        let ids = genres::fetch_request_genres(request_id, &mut conn).await?;
        Ok(ids)
    }

    async fn fetch_project_for_request(&self, request_id: i64) -> Result<Option<Project>, ProjectApiError> {
        let mut conn = self.pool.acquire().await?;
        let project = projects::fetch_project_for_request(request_id, &mut conn).await?;
        Ok(project)
    }

    async fn fetch_project(&self, project_id: i64) -> Result<Option<Project>, ProjectApiError> {
        let mut conn = self.pool.acquire().await?;
        let project = projects::fetch_project(project_id, &mut conn).await?;
        Ok(project)
    }

    async fn fetch_project_genres(&self, project_id: i64) -> Result<Vec<i64>, ProjectApiError> {
        let mut conn = self.pool.acquire().await?;
        let ids = genres::fetch_project_genres(project_id, &mut conn).await?;
        Ok(ids)
    }

    async fn fetch_service_assignment(&self, project_id: i64) -> Result<Option<ServiceAssignment>, ProjectApiError> {
        let mut conn = self.pool.acquire().await?;
        let assignment = projects::fetch_assignment(project_id, &mut conn).await?;
        Ok(assignment)
    }

    async fn fetch_ledger_entry_for_request(
        &self,
        request_id: i64,
    ) -> Result<Option<PaymentLedgerEntry>, ProjectApiError> {
        let mut conn = self.pool.acquire().await?;
        let entry = ledger::fetch_entry_for_request(request_id, &mut conn).await?;
        Ok(entry)
    }

    async fn fetch_ledger_entry_for_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Option<PaymentLedgerEntry>, ProjectApiError> {
        let mut conn = self.pool.acquire().await?;
        let entry = ledger::fetch_entry_for_transaction(transaction_id, &mut conn).await?;
        Ok(entry)
    }
}

impl TierPolicies for SqliteDatabase {
    async fn fetch_tier_policy(&self, label: &str) -> Result<Option<TierPolicy>, TierPolicyError> {
        let mut conn = self.pool.acquire().await?;
        let policy = tier_policies::fetch_tier_policy(label, &mut conn).await?;
        Ok(policy)
    }

    async fn fetch_tier_policies(&self) -> Result<Vec<TierPolicy>, TierPolicyError> {
        let mut conn = self.pool.acquire().await?;
        let policies = tier_policies::fetch_tier_policies(&mut conn).await?;
        Ok(policies)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using `AMP_DATABASE_URL` (or the default) as the database URL.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        SqliteDatabase::new_with_options(url, max_connections, DEFAULT_BUSY_TIMEOUT).await
    }

    pub async fn new_with_options(url: &str, max_connections: u32, busy_timeout: Duration) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections, busy_timeout).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date using the migrations embedded in this crate.
    pub async fn run_migrations(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
