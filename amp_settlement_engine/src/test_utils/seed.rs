use amp_common::Cents;
use chrono::Utc;

use crate::{
    db_types::{Genre, NewServiceRequest, ServiceCategory, ServiceRequest, ServiceRequestStatus, TierPolicy},
    sqlite::db::{genres, service_requests, tier_policies},
    SqliteDatabase,
};

pub fn tier(label: &str, price: i64, revisions: i64, stems: i64, days: i64, commission: f64) -> TierPolicy {
    TierPolicy {
        label: label.to_string(),
        price: Cents::from_major_units(price),
        number_of_revisions: revisions,
        stems_allowance: stems,
        delivery_days: days,
        commission_percentage: commission,
        updated_at: Utc::now(),
    }
}

/// $299, 3 revisions, 2 stems, 7 days, 10% commission.
pub fn gold_tier() -> TierPolicy {
    tier("GOLD", 299, 3, 2, 7, 10.0)
}

/// $99, 1 revision, no stems, 3 days, 15% commission.
pub fn bronze_tier() -> TierPolicy {
    tier("BRONZE", 99, 1, 0, 3, 15.0)
}

pub async fn save_tier(db: &SqliteDatabase, policy: &TierPolicy) -> TierPolicy {
    let mut conn = db.pool().acquire().await.expect("Error acquiring connection");
    tier_policies::upsert_tier_policy(policy, &mut conn).await.expect("Error saving tier policy")
}

pub async fn save_genres(db: &SqliteDatabase, names: &[&str]) -> Vec<Genre> {
    let mut conn = db.pool().acquire().await.expect("Error acquiring connection");
    let mut result = Vec::with_capacity(names.len());
    for name in names {
        result.push(genres::insert_genre(name, &mut conn).await.expect("Error saving genre"));
    }
    result
}

pub async fn save_request(db: &SqliteDatabase, request: NewServiceRequest) -> ServiceRequest {
    let mut tx = db.pool().begin().await.expect("Error starting transaction");
    let request = service_requests::insert_service_request(request, &mut tx).await.expect("Error saving request");
    tx.commit().await.expect("Error committing request");
    request
}

/// A service request awaiting payment, for the given artist and tier.
pub fn awaiting_payment(artist: &str, tier: &str, category: ServiceCategory) -> NewServiceRequest {
    NewServiceRequest::new(artist, tier, category).with_status(ServiceRequestStatus::AwaitingPayment)
}

pub async fn set_request_status(db: &SqliteDatabase, request_id: i64, status: ServiceRequestStatus) {
    let mut conn = db.pool().acquire().await.expect("Error acquiring connection");
    service_requests::set_status(request_id, status, Utc::now(), &mut conn)
        .await
        .expect("Error updating status")
        .expect("Status change was refused");
}

pub async fn count_rows(db: &SqliteDatabase, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(db.pool())
        .await
        .expect("Error counting rows")
}

/// Number of rows in each of the tables settlement writes to: `(payment_ledger, projects, project_genres,
/// service_assignments)`.
pub async fn settlement_row_counts(db: &SqliteDatabase) -> (i64, i64, i64, i64) {
    (
        count_rows(db, "payment_ledger").await,
        count_rows(db, "projects").await,
        count_rows(db, "project_genres").await,
        count_rows(db, "service_assignments").await,
    )
}
