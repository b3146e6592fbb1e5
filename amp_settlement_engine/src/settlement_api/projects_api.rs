use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::{
    db_types::{PaymentLedgerEntry, Project, ServiceAssignment, TierPolicy},
    traits::{ProjectApiError, ProjectManagement, TierPolicies, TierPolicyError},
};

/// A project along with the records that were created with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDetail {
    pub project: Project,
    pub genre_ids: Vec<i64>,
    pub assignment: Option<ServiceAssignment>,
}

/// Read-only access to settled projects, the payment ledger and the tier policies.
pub struct ProjectsApi<B> {
    db: B,
}

impl<B> Debug for ProjectsApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ProjectsApi")
    }
}

impl<B> ProjectsApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> ProjectsApi<B>
where B: ProjectManagement
{
    /// The project that settlement created from the given service request, or `None` if the request has not been
    /// settled.
    pub async fn project_for_request(&self, request_id: i64) -> Result<Option<ProjectDetail>, ProjectApiError> {
        match self.db.fetch_project_for_request(request_id).await? {
            Some(project) => Ok(Some(self.detail(project).await?)),
            None => Ok(None),
        }
    }

    pub async fn project_by_id(&self, project_id: i64) -> Result<Option<ProjectDetail>, ProjectApiError> {
        match self.db.fetch_project(project_id).await? {
            Some(project) => Ok(Some(self.detail(project).await?)),
            None => Ok(None),
        }
    }

    pub async fn ledger_entry_for_request(
        &self,
        request_id: i64,
    ) -> Result<Option<PaymentLedgerEntry>, ProjectApiError> {
        self.db.fetch_ledger_entry_for_request(request_id).await
    }

    pub async fn ledger_entry_for_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Option<PaymentLedgerEntry>, ProjectApiError> {
        self.db.fetch_ledger_entry_for_transaction(transaction_id).await
    }

    async fn detail(&self, project: Project) -> Result<ProjectDetail, ProjectApiError> {
        let genre_ids = self.db.fetch_project_genres(project.id).await?;
        let assignment = self.db.fetch_service_assignment(project.id).await?;
        Ok(ProjectDetail { project, genre_ids, assignment })
    }
}

impl<B> ProjectsApi<B>
where B: TierPolicies
{
    pub async fn tier_policies(&self) -> Result<Vec<TierPolicy>, TierPolicyError> {
        self.db.fetch_tier_policies().await
    }
}
