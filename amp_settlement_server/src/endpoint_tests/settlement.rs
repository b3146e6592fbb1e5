use actix_web::{http::StatusCode, test, web, web::ServiceConfig, App};
use amp_settlement_engine::{
    db_types::{ServiceCategory, ServiceRequest},
    events::EventProducers,
    test_utils::{
        mock_gateway::{completed_transaction, transaction_with_status},
        prepare_env::{destroy_database, fresh_database},
        seed::{awaiting_payment, gold_tier, save_request, save_tier, settlement_row_counts},
    },
    GatewayError,
    GatewayPaymentStatus,
    GatewayTransaction,
    SettlementApi,
    SqliteDatabase,
};

use super::{
    helpers::{get, get_request, json},
    mocks::MockGateway,
};
use crate::routes::VerifySettlementRoute;

async fn setup() -> (SqliteDatabase, ServiceRequest) {
    let db = fresh_database(2).await;
    save_tier(&db, &gold_tier()).await;
    let request = save_request(&db, awaiting_payment("artist_1", "GOLD", ServiceCategory::Mixing)).await;
    (db, request)
}

fn configure(db: SqliteDatabase, gateway: MockGateway) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let api = SettlementApi::new(db, gateway, EventProducers::default());
        cfg.app_data(web::Data::new(api)).service(VerifySettlementRoute::<SqliteDatabase, MockGateway>::new());
    }
}

fn gateway_returning(tx: GatewayTransaction) -> MockGateway {
    let mut gateway = MockGateway::new();
    let txid = tx.transaction_id.clone();
    gateway.expect_retrieve_transaction().withf(move |id| id == txid).returning(move |_| Ok(tx.clone()));
    gateway
}

fn gateway_failing(error: GatewayError) -> MockGateway {
    let mut gateway = MockGateway::new();
    gateway.expect_retrieve_transaction().times(1).returning(move |_| Err(error.clone()));
    gateway
}

#[actix_web::test]
async fn missing_transaction_parameter() {
    let (db, _) = setup().await;
    let mut gateway = MockGateway::new();
    gateway.expect_retrieve_transaction().never();
    let (status, body) = get_request("/settlement/verify", configure(db.clone(), gateway)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body = json(&body);
    assert_eq!(body["error"], "Invalid query. The 'transaction' query parameter is required");
    assert_eq!(body["retryable"], false);
    destroy_database(db).await;
}

#[actix_web::test]
async fn malformed_transaction_id() {
    let (db, _) = setup().await;
    let mut gateway = MockGateway::new();
    gateway.expect_retrieve_transaction().never();
    let (status, _) =
        get_request("/settlement/verify?transaction=cs_1%2F..%2Fcharges", configure(db.clone(), gateway)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = get_request("/settlement/verify?transaction=%20%20", configure(db.clone(), MockGateway::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    destroy_database(db).await;
}

#[actix_web::test]
async fn pending_transaction_writes_nothing() {
    let (db, request) = setup().await;
    let tx = transaction_with_status("cs_pending", request.id, "artist_1", 32890, GatewayPaymentStatus::Pending);
    let gateway = gateway_returning(tx);
    let (status, body) = get_request("/settlement/verify?transaction=cs_pending", configure(db.clone(), gateway)).await;
    assert_eq!(status, StatusCode::OK);
    let expected = format!(r#"{{"status":"pending","requestId":{},"projectId":null,"isNewlyProcessed":false}}"#, request.id);
    assert_eq!(body, expected);
    assert_eq!(settlement_row_counts(&db).await, (0, 0, 0, 0));
    destroy_database(db).await;
}

#[actix_web::test]
async fn paid_transaction_is_settled_once() {
    let (db, request) = setup().await;
    let gateway = gateway_returning(completed_transaction("cs_paid", request.id, "artist_1", 32890));
    let app = App::new().configure(configure(db.clone(), gateway));
    let service = test::init_service(app).await;

    let (status, body) = get(&service, "/settlement/verify?transaction=cs_paid").await;
    assert_eq!(status, StatusCode::OK);
    let first = json(&body);
    assert_eq!(first["status"], "paid");
    assert_eq!(first["requestId"], request.id);
    assert_eq!(first["isNewlyProcessed"], true);
    assert!(first["projectId"].is_i64());

    // the confirmation page reloads
    let (status, body) = get(&service, "/settlement/verify?transaction=cs_paid").await;
    assert_eq!(status, StatusCode::OK);
    let second = json(&body);
    assert_eq!(second["projectId"], first["projectId"]);
    assert_eq!(second["isNewlyProcessed"], false);

    assert_eq!(settlement_row_counts(&db).await, (1, 1, 0, 1));
    destroy_database(db).await;
}

#[actix_web::test]
async fn gateway_timeout_is_retryable() {
    let (db, _) = setup().await;
    let gateway = gateway_failing(GatewayError::Timeout);
    let (status, body) = get_request("/settlement/verify?transaction=cs_slow", configure(db.clone(), gateway)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json(&body)["retryable"], true);
    assert_eq!(settlement_row_counts(&db).await, (0, 0, 0, 0));
    destroy_database(db).await;
}

#[actix_web::test]
async fn unknown_transaction() {
    let (db, _) = setup().await;
    let gateway = gateway_failing(GatewayError::TransactionNotFound("cs_nope".into()));
    let (status, body) = get_request("/settlement/verify?transaction=cs_nope", configure(db.clone(), gateway)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["retryable"], false);
    destroy_database(db).await;
}

#[actix_web::test]
async fn missing_metadata_is_a_server_error() {
    let (db, _) = setup().await;
    let mut tx = completed_transaction("cs_bare", 1, "artist_1", 32890);
    tx.metadata = Default::default();
    let gateway = gateway_returning(tx);
    let (status, body) = get_request("/settlement/verify?transaction=cs_bare", configure(db.clone(), gateway)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body = json(&body);
    assert_eq!(body["retryable"], false);
    assert!(body["error"].as_str().unwrap().contains("serviceRequestId"));
    assert_eq!(settlement_row_counts(&db).await, (0, 0, 0, 0));
    destroy_database(db).await;
}

#[actix_web::test]
async fn unknown_service_request() {
    let (db, request) = setup().await;
    let gateway = gateway_returning(completed_transaction("cs_orphan", request.id + 50, "artist_1", 32890));
    let (status, body) = get_request("/settlement/verify?transaction=cs_orphan", configure(db.clone(), gateway)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["error"], format!("Service request #{} does not exist", request.id + 50));
    assert_eq!(settlement_row_counts(&db).await, (0, 0, 0, 0));
    destroy_database(db).await;
}
