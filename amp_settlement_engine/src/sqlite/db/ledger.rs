use log::{debug, warn};
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewLedgerEntry, PaymentLedgerEntry},
    traits::{InsertLedgerResult, SettlementError},
};

/// Inserts the ledger entry, relying on the table's uniqueness constraints to detect a payment that has already been
/// recorded.
///
/// If an entry exists for the same gateway transaction, or for the same service request, that entry is returned as
/// [`InsertLedgerResult::AlreadyExists`]. If the existing entry belongs to a *different* gateway transaction, the
/// request has been paid twice. The collision is still absorbed, but a warning is logged so the second payment can be
/// reviewed.
pub async fn idempotent_insert(
    entry: NewLedgerEntry,
    conn: &mut SqliteConnection,
) -> Result<InsertLedgerResult, SettlementError> {
    let txid = entry.gateway_transaction_id.clone();
    let request_id = entry.service_request_id;
    match insert_ledger_entry(entry, conn).await {
        Ok(inserted) => {
            debug!("🗃️ Ledger entry #{} recorded for transaction {txid}", inserted.id);
            Ok(InsertLedgerResult::Inserted(inserted))
        },
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
            let existing = match fetch_entry_for_transaction(&txid, conn).await? {
                Some(e) => e,
                None => fetch_entry_for_request(request_id, conn).await?.ok_or_else(|| {
                    SettlementError::DatabaseError(format!(
                        "Ledger insert for {txid} hit a uniqueness violation, but no conflicting entry was found"
                    ))
                })?,
            };
            if existing.gateway_transaction_id != txid {
                warn!(
                    "🗃️ Service request #{request_id} has already been paid by transaction {}, but transaction {txid} \
                     was also completed for it. The second payment needs to be reviewed.",
                    existing.gateway_transaction_id
                );
            } else {
                debug!("🗃️ Ledger entry for transaction {txid} already exists (#{})", existing.id);
            }
            Ok(InsertLedgerResult::AlreadyExists(existing))
        },
        Err(e) => Err(e.into()),
    }
}

async fn insert_ledger_entry(
    entry: NewLedgerEntry,
    conn: &mut SqliteConnection,
) -> Result<PaymentLedgerEntry, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO payment_ledger (
                service_request_id,
                gateway_transaction_id,
                payment_reference_id,
                total_amount,
                platform_fee,
                creator_amount,
                currency,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *;
        "#,
    )
    .bind(entry.service_request_id)
    .bind(entry.gateway_transaction_id)
    .bind(entry.payment_reference_id)
    .bind(entry.total_amount)
    .bind(entry.platform_fee)
    .bind(entry.creator_amount)
    .bind(entry.currency)
    .bind(entry.created_at)
    .fetch_one(conn)
    .await
}

pub async fn fetch_entry_for_transaction(
    txid: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentLedgerEntry>, sqlx::Error> {
    let entry = sqlx::query_as("SELECT * FROM payment_ledger WHERE gateway_transaction_id = $1")
        .bind(txid)
        .fetch_optional(conn)
        .await?;
    Ok(entry)
}

pub async fn fetch_entry_for_request(
    request_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentLedgerEntry>, sqlx::Error> {
    let entry = sqlx::query_as("SELECT * FROM payment_ledger WHERE service_request_id = $1")
        .bind(request_id)
        .fetch_optional(conn)
        .await?;
    Ok(entry)
}
