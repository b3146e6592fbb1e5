use amp_settlement_engine::events::{EventHandlers, EventHooks, ProjectFundedEvent};
use futures::future::BoxFuture;
use log::*;

pub const FUNDED_PROJECT_EVENT_BUFFER_SIZE: usize = 25;

/// Log target for newly funded projects. Dashboards and the chat bridge tail this target.
pub const FUNDED_PROJECTS_LOG_TARGET: &str = "amp::funded_projects";

/// Hooks that announce every newly funded project on [`FUNDED_PROJECTS_LOG_TARGET`], as a single JSON line.
pub fn create_funded_project_handlers() -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_project_funded(log_funded_project);
    EventHandlers::new(FUNDED_PROJECT_EVENT_BUFFER_SIZE, hooks)
}

fn log_funded_project(ev: ProjectFundedEvent) -> BoxFuture<'static, ()> {
    Box::pin(async move {
        info!(target: FUNDED_PROJECTS_LOG_TARGET, "{}", funded_project_summary(&ev));
    })
}

pub fn funded_project_summary(ev: &ProjectFundedEvent) -> String {
    let ProjectFundedEvent { project, ledger_entry } = ev;
    serde_json::json!({
        "projectId": project.id,
        "serviceRequestId": project.source_service_request_id,
        "artistId": project.owner_artist_id,
        "projectType": project.project_type.to_string(),
        "tier": project.tier_label,
        "deliveryDeadline": project.delivery_deadline,
        "totalAmount": ledger_entry.total_amount.value(),
        "creatorAmount": ledger_entry.creator_amount.value(),
        "currency": ledger_entry.currency,
    })
    .to_string()
}
