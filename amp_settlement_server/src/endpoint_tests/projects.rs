use actix_web::{http::StatusCode, test, web, web::ServiceConfig, App};
use amp_settlement_engine::{
    db_types::ServiceCategory,
    events::EventProducers,
    test_utils::{
        mock_gateway::{completed_transaction, MockGateway},
        prepare_env::{destroy_database, fresh_database},
        seed::{awaiting_payment, bronze_tier, gold_tier, save_genres, save_request, save_tier},
    },
    ProjectsApi,
    SettlementApi,
    SqliteDatabase,
};

use super::helpers::{get, json};
use crate::routes::{PaymentForRequestRoute, ProjectForRequestRoute, TiersRoute};

fn configure(db: SqliteDatabase) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        cfg.app_data(web::Data::new(ProjectsApi::new(db)))
            .service(ProjectForRequestRoute::<SqliteDatabase>::new())
            .service(PaymentForRequestRoute::<SqliteDatabase>::new())
            .service(TiersRoute::<SqliteDatabase>::new());
    }
}

#[actix_web::test]
async fn settled_and_unsettled_requests() {
    let db = fresh_database(2).await;
    save_tier(&db, &gold_tier()).await;
    let genres = save_genres(&db, &["House"]).await;
    let request = awaiting_payment("artist_1", "GOLD", ServiceCategory::Recording).with_genres(&[genres[0].id]);
    let request = save_request(&db, request).await;
    let unsettled = save_request(&db, awaiting_payment("artist_2", "GOLD", ServiceCategory::Mixing)).await;

    let gateway = MockGateway::new();
    gateway.add_transaction(completed_transaction("cs_view", request.id, "artist_1", 32890));
    let settlement = SettlementApi::new(db.clone(), gateway, EventProducers::default());
    let project_id = settlement.settle("cs_view").await.unwrap().project_id.unwrap();

    let service = test::init_service(App::new().configure(configure(db.clone()))).await;

    let (status, body) = get(&service, &format!("/requests/{}/project", request.id)).await;
    assert_eq!(status, StatusCode::OK);
    let detail = json(&body);
    assert_eq!(detail["project"]["id"], project_id);
    assert_eq!(detail["project"]["project_type"], "PRODUCTION");
    assert_eq!(detail["project"]["revision_limit"], 3);
    assert_eq!(detail["project"]["stems_included"], true);
    assert_eq!(detail["genre_ids"], serde_json::json!([genres[0].id]));
    assert_eq!(detail["assignment"]["category"], "PRODUCTION");

    let (status, body) = get(&service, &format!("/requests/{}/payment", request.id)).await;
    assert_eq!(status, StatusCode::OK);
    let entry = json(&body);
    assert_eq!(entry["gateway_transaction_id"], "cs_view");
    assert_eq!(entry["total_amount"], 32890);
    assert_eq!(entry["platform_fee"], 3289);
    assert_eq!(entry["creator_amount"], 29601);
    assert_eq!(entry["currency"], "USD");

    let (status, body) = get(&service, &format!("/requests/{}/project", unsettled.id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["retryable"], false);
    let (status, _) = get(&service, &format!("/requests/{}/payment", unsettled.id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    destroy_database(db).await;
}

#[actix_web::test]
async fn tier_listing() {
    let db = fresh_database(1).await;
    save_tier(&db, &gold_tier()).await;
    save_tier(&db, &bronze_tier()).await;
    let service = test::init_service(App::new().configure(configure(db.clone()))).await;
    let (status, body) = get(&service, "/tiers").await;
    assert_eq!(status, StatusCode::OK);
    let tiers = json(&body);
    let labels = tiers.as_array().unwrap().iter().map(|t| t["label"].as_str().unwrap()).collect::<Vec<_>>();
    assert_eq!(labels, vec!["BRONZE", "GOLD"]);
    assert_eq!(tiers[1]["price"], 29900);
    assert_eq!(tiers[1]["commission_percentage"], 10.0);
    destroy_database(db).await;
}
