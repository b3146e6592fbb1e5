use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::TierPolicy;

/// Creates or replaces the tier policy with the same label.
///
/// Tiers are maintained by the catalog screens. Settlement never calls this.
pub async fn upsert_tier_policy(policy: &TierPolicy, conn: &mut SqliteConnection) -> Result<TierPolicy, sqlx::Error> {
    let result = sqlx::query_as(
        r#"
            INSERT INTO tier_policies (
                label,
                price,
                number_of_revisions,
                stems_allowance,
                delivery_days,
                commission_percentage,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (label) DO UPDATE SET
                price = excluded.price,
                number_of_revisions = excluded.number_of_revisions,
                stems_allowance = excluded.stems_allowance,
                delivery_days = excluded.delivery_days,
                commission_percentage = excluded.commission_percentage,
                updated_at = excluded.updated_at
            RETURNING *;
        "#,
    )
    .bind(&policy.label)
    .bind(policy.price)
    .bind(policy.number_of_revisions)
    .bind(policy.stems_allowance)
    .bind(policy.delivery_days)
    .bind(policy.commission_percentage)
    .bind(policy.updated_at)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Tier policy {} saved", policy.label);
    Ok(result)
}

pub async fn fetch_tier_policy(label: &str, conn: &mut SqliteConnection) -> Result<Option<TierPolicy>, sqlx::Error> {
    let policy = sqlx::query_as("SELECT * FROM tier_policies WHERE label = $1").bind(label).fetch_optional(conn).await?;
    Ok(policy)
}

pub async fn fetch_tier_policies(conn: &mut SqliteConnection) -> Result<Vec<TierPolicy>, sqlx::Error> {
    let policies = sqlx::query_as("SELECT * FROM tier_policies ORDER BY label").fetch_all(conn).await?;
    Ok(policies)
}
