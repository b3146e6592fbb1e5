use chrono::{DateTime, Utc};
use log::{debug, trace, warn};
use sqlx::SqliteConnection;

use super::genres;
use crate::db_types::{NewServiceRequest, ServiceRequest, ServiceRequestStatus};

/// Inserts a new service request, along with its genre links. This is not atomic. Pass `&mut *tx` as the connection
/// if you need the request and its genre links to be written together.
///
/// Service requests are normally created by the request form. The settlement engine only reads them and moves them
/// to `Paid`, so this is mostly used for seeding and tests.
pub async fn insert_service_request(
    request: NewServiceRequest,
    conn: &mut SqliteConnection,
) -> Result<ServiceRequest, sqlx::Error> {
    let genre_ids = request.genre_ids.clone();
    let result: ServiceRequest = sqlx::query_as(
        r#"
            INSERT INTO service_requests (
                owner_artist_id,
                assigned_creator_id,
                tier_label,
                service_category,
                project_name,
                artist_name,
                bpm,
                musical_key,
                track_count,
                reference_track_url,
                notes,
                status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *;
        "#,
    )
    .bind(request.owner_artist_id)
    .bind(request.assigned_creator_id)
    .bind(request.tier_label)
    .bind(request.service_category)
    .bind(request.project_name)
    .bind(request.artist_name)
    .bind(request.technical.bpm)
    .bind(request.technical.musical_key)
    .bind(request.technical.track_count)
    .bind(request.technical.reference_track_url)
    .bind(request.technical.notes)
    .bind(request.status)
    .fetch_one(&mut *conn)
    .await?;
    for genre_id in genre_ids {
        genres::link_request_genre(result.id, genre_id, conn).await?;
    }
    debug!("🗃️ Service request #{} created for artist {}", result.id, result.owner_artist_id);
    Ok(result)
}

pub async fn fetch_service_request(
    request_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<ServiceRequest>, sqlx::Error> {
    let request = sqlx::query_as("SELECT * FROM service_requests WHERE id = $1")
        .bind(request_id)
        .fetch_optional(conn)
        .await?;
    Ok(request)
}

/// Moves the service request to `Paid` and stamps `status_updated_at`, but only if the request is currently in one of
/// the payable statuses. Requests that are already paid, further along, or cancelled are left untouched.
///
/// Returns the updated request, or `None` if no row was changed.
pub async fn mark_paid(
    request_id: i64,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<ServiceRequest>, sqlx::Error> {
    let [a, b, c] = ServiceRequestStatus::payable();
    let updated: Option<ServiceRequest> = sqlx::query_as(
        r#"
            UPDATE service_requests
            SET status = $1, status_updated_at = $2
            WHERE id = $3 AND status IN ($4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(ServiceRequestStatus::Paid)
    .bind(now)
    .bind(request_id)
    .bind(a)
    .bind(b)
    .bind(c)
    .fetch_optional(conn)
    .await?;
    trace!("🗃️ Service request #{request_id} marked as paid: {}", updated.is_some());
    Ok(updated)
}

/// Moves a service request along its workflow. Status changes other than `Paid` belong to the request and production
/// workflows; this exists for those collaborators and for tests.
///
/// Only forward moves allowed by [`ServiceRequestStatus::can_transition_to`] are written. `Paid` is refused here,
/// since it is only reachable through settlement ([`mark_paid`]). Returns `None` if the request does not exist, the
/// move is refused, or the request changed status underneath us.
pub async fn set_status(
    request_id: i64,
    status: ServiceRequestStatus,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<ServiceRequest>, sqlx::Error> {
    let Some(current) = fetch_service_request(request_id, &mut *conn).await? else {
        return Ok(None);
    };
    if status == ServiceRequestStatus::Paid || !current.status.can_transition_to(status) {
        warn!("🗃️ Refusing to move service request #{request_id} from {} to {status}", current.status);
        return Ok(None);
    }
    let updated = sqlx::query_as(
        r#"
            UPDATE service_requests
            SET status = $1, status_updated_at = $2
            WHERE id = $3 AND status = $4
            RETURNING *;
        "#,
    )
    .bind(status)
    .bind(now)
    .bind(request_id)
    .bind(current.status)
    .fetch_optional(conn)
    .await?;
    Ok(updated)
}
