use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewProject, NewServiceAssignment, Project, ServiceAssignment},
    traits::SettlementError,
};

/// Inserts the project row only. The assignment in `project.assignment` is *not* written here; see
/// [`insert_assignment`].
///
/// A second project for the same source service request is rejected by the store with
/// [`SettlementError::ProjectAlreadyExists`].
pub async fn insert_project(project: NewProject, conn: &mut SqliteConnection) -> Result<Project, SettlementError> {
    let source_id = project.source_service_request_id;
    let result: Project = sqlx::query_as(
        r#"
            INSERT INTO projects (
                owner_artist_id,
                source_service_request_id,
                project_name,
                artist_name,
                project_type,
                tier_label,
                bpm,
                musical_key,
                track_count,
                reference_track_url,
                notes,
                revision_limit,
                delivery_deadline,
                stems_included,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *;
        "#,
    )
    .bind(project.owner_artist_id)
    .bind(source_id)
    .bind(project.project_name)
    .bind(project.artist_name)
    .bind(project.project_type)
    .bind(project.tier_label)
    .bind(project.technical.bpm)
    .bind(project.technical.musical_key)
    .bind(project.technical.track_count)
    .bind(project.technical.reference_track_url)
    .bind(project.technical.notes)
    .bind(project.revision_limit)
    .bind(project.delivery_deadline)
    .bind(project.stems_included)
    .bind(project.created_at)
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_unique_violation() => SettlementError::ProjectAlreadyExists(source_id),
        _ => SettlementError::from(e),
    })?;
    debug!("🗃️ Project #{} created from service request #{source_id}", result.id);
    Ok(result)
}

pub async fn insert_assignment(
    project_id: i64,
    assignment: NewServiceAssignment,
    conn: &mut SqliteConnection,
) -> Result<ServiceAssignment, sqlx::Error> {
    let result = sqlx::query_as(
        r#"
            INSERT INTO service_assignments (project_id, category, creator_id)
            VALUES ($1, $2, $3)
            RETURNING *;
        "#,
    )
    .bind(project_id)
    .bind(assignment.category)
    .bind(assignment.creator_id)
    .fetch_one(conn)
    .await?;
    Ok(result)
}

pub async fn fetch_project_for_request(
    request_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Project>, sqlx::Error> {
    let project = sqlx::query_as("SELECT * FROM projects WHERE source_service_request_id = $1")
        .bind(request_id)
        .fetch_optional(conn)
        .await?;
    Ok(project)
}

pub async fn fetch_project(project_id: i64, conn: &mut SqliteConnection) -> Result<Option<Project>, sqlx::Error> {
    let project =
        sqlx::query_as("SELECT * FROM projects WHERE id = $1").bind(project_id).fetch_optional(conn).await?;
    Ok(project)
}

pub async fn fetch_assignment(
    project_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<ServiceAssignment>, sqlx::Error> {
    let assignment = sqlx::query_as("SELECT * FROM service_assignments WHERE project_id = $1")
        .bind(project_id)
        .fetch_optional(conn)
        .await?;
    Ok(assignment)
}
