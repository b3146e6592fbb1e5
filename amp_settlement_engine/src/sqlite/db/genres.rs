use sqlx::SqliteConnection;

use crate::db_types::Genre;

/// Creates the genre if it does not exist yet, and returns it.
pub async fn insert_genre(name: &str, conn: &mut SqliteConnection) -> Result<Genre, sqlx::Error> {
    let genre = sqlx::query_as(
        r#"
            INSERT INTO genres (name) VALUES ($1)
            ON CONFLICT (name) DO UPDATE SET name = excluded.name
            RETURNING *;
        "#,
    )
    .bind(name)
    .fetch_one(conn)
    .await?;
    Ok(genre)
}

pub async fn link_request_genre(request_id: i64, genre_id: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT OR IGNORE INTO service_request_genres (service_request_id, genre_id) VALUES ($1, $2)")
        .bind(request_id)
        .bind(genre_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Copies the genre links of the service request onto the project. The project gets its own rows; later changes to
/// the request's genres do not affect it.
///
/// Returns the number of links created.
pub async fn copy_request_genres_to_project(
    request_id: i64,
    project_id: i64,
    conn: &mut SqliteConnection,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
            INSERT OR IGNORE INTO project_genres (project_id, genre_id)
            SELECT $1, genre_id FROM service_request_genres WHERE service_request_id = $2;
        "#,
    )
    .bind(project_id)
    .bind(request_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

pub async fn fetch_request_genres(request_id: i64, conn: &mut SqliteConnection) -> Result<Vec<i64>, sqlx::Error> {
    let ids = sqlx::query_scalar(
        "SELECT genre_id FROM service_request_genres WHERE service_request_id = $1 ORDER BY genre_id",
    )
    .bind(request_id)
    .fetch_all(conn)
    .await?;
    Ok(ids)
}

pub async fn fetch_project_genres(project_id: i64, conn: &mut SqliteConnection) -> Result<Vec<i64>, sqlx::Error> {
    let ids = sqlx::query_scalar("SELECT genre_id FROM project_genres WHERE project_id = $1 ORDER BY genre_id")
        .bind(project_id)
        .fetch_all(conn)
        .await?;
    Ok(ids)
}
