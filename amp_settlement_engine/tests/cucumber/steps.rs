use amp_settlement_engine::{db_types::ServiceRequestStatus, test_utils::seed::count_rows, ProjectManagement};
use chrono::Duration;
use cucumber::{then, when};

use crate::cucumber::SettlementWorld;

#[when(expr = "I settle transaction {string}")]
async fn settle(world: &mut SettlementWorld, txid: String) {
    let sys = world.system();
    let result = sys.api.settle(&txid).await;
    sys.results.push(result);
}

#[then(expr = "the settlement status is {string}")]
async fn settlement_status(world: &mut SettlementWorld, expected: String) {
    let result = world.system().last_result().as_ref().expect("Settlement failed");
    let status = serde_json::to_value(&result.status).unwrap();
    assert_eq!(status.as_str(), Some(expected.as_str()));
}

#[then("the settlement is newly processed")]
async fn newly_processed(world: &mut SettlementWorld) {
    let result = world.system().last_result().as_ref().expect("Settlement failed");
    assert!(result.is_newly_processed);
}

#[then("the last settlement is not newly processed")]
async fn not_newly_processed(world: &mut SettlementWorld) {
    let result = world.system().last_result().as_ref().expect("Settlement failed");
    assert!(!result.is_newly_processed);
}

#[then("every settlement reports the same project")]
async fn same_project(world: &mut SettlementWorld) {
    let sys = world.system();
    let ids = sys.results.iter().map(|r| r.as_ref().expect("Settlement failed").project_id).collect::<Vec<_>>();
    assert!(ids.len() > 1);
    assert!(ids[0].is_some());
    assert!(ids.iter().all(|id| *id == ids[0]), "Project ids differ: {ids:?}");
}

#[then("settlement fails with a fatal error")]
async fn fatal_error(world: &mut SettlementWorld) {
    match world.system().last_result() {
        Err(e) => assert!(e.is_fatal(), "Expected a fatal error, got {e}"),
        Ok(r) => panic!("Expected settlement to fail, but got {r:?}"),
    }
}

#[then(expr = "the ledger entry for {string} has a platform fee of {int} and a creator amount of {int}")]
async fn ledger_split(world: &mut SettlementWorld, alias: String, fee: i64, creator: i64) {
    let sys = world.system();
    let id = sys.request_id(&alias);
    let entry = sys.db().fetch_ledger_entry_for_request(id).await.unwrap().expect("No ledger entry");
    assert_eq!(entry.platform_fee.value(), fee);
    assert_eq!(entry.creator_amount.value(), creator);
    assert_eq!(entry.platform_fee + entry.creator_amount, entry.total_amount);
}

#[then(expr = "the project for {string} has {int} revisions, stems included and is due in {int} days")]
async fn project_terms(world: &mut SettlementWorld, alias: String, revisions: i64, days: i64) {
    let sys = world.system();
    let id = sys.request_id(&alias);
    let project = sys.db().fetch_project_for_request(id).await.unwrap().expect("No project");
    assert_eq!(project.revision_limit, revisions);
    assert!(project.stems_included);
    assert_eq!(project.delivery_deadline - project.created_at, Duration::days(days));
}

#[then(expr = "the project for {string} is a {word} project")]
async fn project_type(world: &mut SettlementWorld, alias: String, category: String) {
    let sys = world.system();
    let id = sys.request_id(&alias);
    let project = sys.db().fetch_project_for_request(id).await.unwrap().expect("No project");
    assert_eq!(project.project_type.to_string(), category);
    let assignment = sys.db().fetch_service_assignment(project.id).await.unwrap().expect("No assignment");
    assert_eq!(assignment.category, project.project_type);
}

#[then(expr = "service request {string} has status {word}")]
async fn request_status(world: &mut SettlementWorld, alias: String, status: String) {
    let sys = world.system();
    let id = sys.request_id(&alias);
    let request = sys.db().fetch_service_request(id).await.unwrap().expect("No service request");
    let expected = status.parse::<ServiceRequestStatus>().expect("Not a valid status");
    assert_eq!(request.status, expected);
}

#[then(expr = "{int} projects exist")]
async fn project_count(world: &mut SettlementWorld, expected: i64) {
    assert_eq!(count_rows(world.system().db(), "projects").await, expected);
}

#[then(expr = "{int} ledger entries exist")]
async fn ledger_count(world: &mut SettlementWorld, expected: i64) {
    assert_eq!(count_rows(world.system().db(), "payment_ledger").await, expected);
}
