use std::fmt::Debug;

use chrono::Utc;
use log::*;

use crate::{
    events::{EventProducers, ProjectFundedEvent},
    settlement_api::settlement_objects::{SettlementMetadata, SettlementResult, SettlementTerms},
    traits::{PaymentGateway, SettlementDatabase, SettlementError, SettlementOutcome},
};

/// Log target for settlement failures that retrying cannot fix. Route this target somewhere a human will see it.
pub const FATAL_LOG_TARGET: &str = "amp::settlement::fatal";

/// `SettlementApi` turns a completed payment at the gateway into a funded project, exactly once.
///
/// It can be called any number of times, concurrently, for the same transaction (client page reloads, gateway
/// callbacks, retries). Only one call ever creates the project and ledger entry; every other call reports the same
/// project with `is_newly_processed == false`.
pub struct SettlementApi<B, G> {
    db: B,
    gateway: G,
    producers: EventProducers,
}

impl<B, G> Debug for SettlementApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementApi")
    }
}

impl<B, G> SettlementApi<B, G> {
    pub fn new(db: B, gateway: G, producers: EventProducers) -> Self {
        Self { db, gateway, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }
}

impl<B, G> SettlementApi<B, G>
where
    B: SettlementDatabase,
    G: PaymentGateway,
{
    /// Settles the gateway transaction with the given id.
    ///
    /// * If the transaction has not completed at the gateway, nothing is written and the gateway's status is reported.
    /// * If the service request has already been settled, its project is reported and nothing is written.
    /// * Otherwise the request is marked as paid, the payment is recorded in the ledger, and the project is created,
    ///   all in one atomic transaction. Subscribers to the project funded hook are then notified.
    ///
    /// Errors for which [`SettlementError::is_fatal`] is true are logged under [`FATAL_LOG_TARGET`].
    pub async fn settle(&self, transaction_id: &str) -> Result<SettlementResult, SettlementError> {
        let txid = transaction_id.trim();
        if txid.is_empty() {
            return Err(SettlementError::InvalidTransactionId("<empty>".into()));
        }
        let result = self.try_settle(txid).await;
        if let Err(e) = &result {
            log_failure(txid, e);
        }
        result
    }

    async fn try_settle(&self, txid: &str) -> Result<SettlementResult, SettlementError> {
        let transaction = self.gateway.retrieve_transaction(txid).await?;
        if !transaction.is_completed() {
            let request_id = SettlementMetadata::peek_request_id(&transaction.metadata);
            info!("💸️ Transaction {txid} is {:?} at the gateway. Nothing to settle yet.", transaction.payment_status);
            return Ok(SettlementResult::not_completed(transaction.payment_status, request_id));
        }
        let metadata = SettlementMetadata::try_from(&transaction.metadata)?;
        let request_id = metadata.service_request_id;
        let request =
            self.db.fetch_service_request(request_id).await?.ok_or(SettlementError::RequestNotFound(request_id))?;
        if let Some(artist) = metadata.artist_user_id.as_deref() {
            if artist != request.owner_artist_id {
                warn!(
                    "💸️ Transaction {txid} names artist {artist}, but service request #{request_id} belongs to {}. \
                     The request owner is used.",
                    request.owner_artist_id
                );
            }
        }
        let tier = self
            .db
            .fetch_tier_policy(&request.tier_label)
            .await?
            .ok_or_else(|| SettlementError::PolicyMissing(request.tier_label.clone()))?;
        if let Some(project) = self.db.fetch_project_for_request(request_id).await? {
            debug!("💸️ Service request #{request_id} was already settled as project #{}", project.id);
            let mut result = SettlementResult::paid(request_id, project.id, false);
            if let Some(recorded) = self.db.fetch_ledger_entry_for_request(request_id).await? {
                result = result.check_duplicate_payment(txid, &recorded);
            }
            log_duplicate_payment(request_id, txid, &result);
            return Ok(result);
        }
        let now = Utc::now();
        let terms = SettlementTerms::derive(&tier, &transaction, now)?;
        trace!(
            "💸️ Terms for request #{request_id}: total {} {}, fee {}, creator {}",
            terms.total_amount,
            terms.currency,
            terms.platform_fee,
            terms.creator_amount
        );
        let creator_id = metadata.creator_id.or_else(|| request.assigned_creator_id.clone());
        let settlement = terms.into_settlement(&request, &transaction, creator_id, now);
        let outcome = self.db.materialize_project(settlement).await?;
        let result = SettlementResult::paid(request_id, outcome.project.id, outcome.newly_processed)
            .check_duplicate_payment(txid, &outcome.ledger_entry);
        log_duplicate_payment(request_id, txid, &result);
        if outcome.newly_processed {
            info!(
                "💸️ Transaction {txid} settled. Service request #{request_id} is now project #{}",
                outcome.project.id
            );
            self.call_project_funded_hook(outcome).await;
        } else {
            debug!("💸️ Service request #{request_id} was settled concurrently by another caller");
        }
        Ok(result)
    }

    async fn call_project_funded_hook(&self, outcome: SettlementOutcome) {
        let SettlementOutcome { project, ledger_entry, .. } = outcome;
        debug!("💸️ Notifying project funded hook subscribers");
        self.producers.publish_project_funded(ProjectFundedEvent::new(project, ledger_entry)).await;
    }
}

fn log_duplicate_payment(request_id: i64, txid: &str, result: &SettlementResult) {
    if let Some(settled_by) = result.duplicate_payment_of.as_deref() {
        warn!(
            target: FATAL_LOG_TARGET,
            "💸️ Service request #{request_id} has already been paid by transaction {settled_by}, but transaction \
             {txid} was also completed for it. The second payment was not recorded and needs to be reviewed."
        );
    }
}

fn log_failure(txid: &str, e: &SettlementError) {
    if e.is_fatal() {
        error!(target: FATAL_LOG_TARGET, "💸️ Settlement of transaction {txid} failed and needs manual attention. {e}");
    } else if e.is_retryable() {
        warn!("💸️ Settlement of transaction {txid} failed, but can be retried. {e}");
    } else {
        info!("💸️ Settlement of transaction {txid} was rejected. {e}");
    }
}

#[cfg(test)]
mod test {
    use amp_common::Cents;
    use chrono::Duration;

    use super::*;
    use crate::{
        db_types::{ProjectCategory, ServiceCategory, ServiceRequestStatus, TechnicalMetadata},
        settlement_api::settlement_objects::SettlementStatus,
        test_utils::{
            mock_gateway::{completed_transaction, transaction_with_status, MockGateway},
            prepare_env::{destroy_database, fresh_database},
            seed::{
                awaiting_payment,
                bronze_tier,
                gold_tier,
                save_genres,
                save_request,
                save_tier,
                set_request_status,
                settlement_row_counts,
            },
        },
        traits::{GatewayError, GatewayPaymentStatus, ProjectManagement, TransactionMetadata},
        SqliteDatabase,
    };

    async fn setup() -> (SettlementApi<SqliteDatabase, MockGateway>, MockGateway) {
        let db = fresh_database(5).await;
        save_tier(&db, &gold_tier()).await;
        save_tier(&db, &bronze_tier()).await;
        let gateway = MockGateway::new();
        let api = SettlementApi::new(db, gateway.clone(), EventProducers::default());
        (api, gateway)
    }

    async fn tear_down(api: SettlementApi<SqliteDatabase, MockGateway>) {
        destroy_database(api.db).await;
    }

    #[tokio::test]
    async fn gold_tier_settlement() {
        let (api, gateway) = setup().await;
        let genres = save_genres(api.db(), &["House", "Disco"]).await;
        let technical = TechnicalMetadata { bpm: Some(124), track_count: Some(1), ..Default::default() };
        let request = awaiting_payment("artist_1", "GOLD", ServiceCategory::Mixing)
            .with_names("Summer EP", "Lia")
            .with_technical(technical.clone())
            .with_genres(&[genres[0].id, genres[1].id]);
        let request = save_request(api.db(), request).await;
        let metadata =
            TransactionMetadata::new().with("serviceRequestId", &request.id.to_string()).with("creatorId", "creator_5");
        let tx = completed_transaction("cs_gold", request.id, "artist_1", 32890).with_metadata(metadata);
        gateway.add_transaction(tx);

        let before = chrono::Utc::now();
        let result = api.settle("cs_gold").await.expect("settlement failed");
        let after = chrono::Utc::now();
        assert_eq!(result.status, SettlementStatus::Paid);
        assert_eq!(result.request_id, Some(request.id));
        assert!(result.is_newly_processed);
        let project_id = result.project_id.expect("project id");

        let db = api.db();
        let entry = db.fetch_ledger_entry_for_request(request.id).await.unwrap().expect("ledger entry");
        assert_eq!(entry.gateway_transaction_id, "cs_gold");
        assert_eq!(entry.payment_reference_id, "pi_cs_gold");
        assert_eq!(entry.total_amount, Cents::from(32890));
        assert_eq!(entry.platform_fee, Cents::from(3289));
        assert_eq!(entry.creator_amount, Cents::from(29601));
        assert_eq!(entry.currency, "USD");

        let project = db.fetch_project(project_id).await.unwrap().expect("project");
        assert_eq!(project.source_service_request_id, request.id);
        assert_eq!(project.owner_artist_id, "artist_1");
        assert_eq!(project.project_name, "Summer EP");
        assert_eq!(project.artist_name, "Lia");
        assert_eq!(project.project_type, ProjectCategory::Mixing);
        assert_eq!(project.tier_label, "GOLD");
        assert_eq!(project.technical, technical);
        assert_eq!(project.revision_limit, 3);
        assert!(project.stems_included);
        assert!(project.delivery_deadline >= before + Duration::days(7));
        assert!(project.delivery_deadline <= after + Duration::days(7));
        assert_eq!(project.delivery_deadline - project.created_at, Duration::days(7));

        let mut expected_genres = vec![genres[0].id, genres[1].id];
        expected_genres.sort();
        assert_eq!(db.fetch_project_genres(project_id).await.unwrap(), expected_genres);
        let assignment = db.fetch_service_assignment(project_id).await.unwrap().expect("assignment");
        assert_eq!(assignment.category, ProjectCategory::Mixing);
        assert_eq!(assignment.creator_id.as_deref(), Some("creator_5"));

        let request = db.fetch_service_request(request.id).await.unwrap().unwrap();
        assert_eq!(request.status, ServiceRequestStatus::Paid);
        assert_eq!(request.status_updated_at, project.created_at);
        tear_down(api).await;
    }

    #[tokio::test]
    async fn pending_transaction_is_a_no_op() {
        let (api, gateway) = setup().await;
        let request = save_request(api.db(), awaiting_payment("artist_1", "GOLD", ServiceCategory::Mixing)).await;
        gateway.add_transaction(transaction_with_status(
            "cs_pending",
            request.id,
            "artist_1",
            32890,
            GatewayPaymentStatus::Pending,
        ));
        let result = api.settle("cs_pending").await.unwrap();
        assert_eq!(result.status, SettlementStatus::Pending);
        assert_eq!(result.project_id, None);
        assert_eq!(result.request_id, Some(request.id));
        assert!(!result.is_newly_processed);
        assert_eq!(settlement_row_counts(api.db()).await, (0, 0, 0, 0));
        let unchanged = api.db().fetch_service_request(request.id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, ServiceRequestStatus::AwaitingPayment);

        gateway.set_status("cs_pending", GatewayPaymentStatus::Failed);
        let result = api.settle("cs_pending").await.unwrap();
        assert_eq!(result.status, SettlementStatus::Failed);
        assert_eq!(settlement_row_counts(api.db()).await, (0, 0, 0, 0));

        // the artist pays after all
        gateway.set_status("cs_pending", GatewayPaymentStatus::Completed);
        let result = api.settle("cs_pending").await.unwrap();
        assert_eq!(result.status, SettlementStatus::Paid);
        assert!(result.is_newly_processed);
        tear_down(api).await;
    }

    #[tokio::test]
    async fn repeated_settlement_returns_the_same_project() {
        let (api, gateway) = setup().await;
        let request = save_request(api.db(), awaiting_payment("artist_1", "BRONZE", ServiceCategory::Mastering)).await;
        gateway.add_transaction(completed_transaction("cs_twice", request.id, "artist_1", 9900));
        let first = api.settle("cs_twice").await.unwrap();
        let second = api.settle("cs_twice").await.unwrap();
        assert!(first.is_newly_processed);
        assert!(!second.is_newly_processed);
        assert_eq!(first.project_id, second.project_id);
        assert_eq!(second.status, SettlementStatus::Paid);
        assert_eq!(settlement_row_counts(api.db()).await, (1, 1, 0, 1));
        tear_down(api).await;
    }

    #[tokio::test]
    async fn concurrent_settlements_create_one_project() {
        let (api, gateway) = setup().await;
        let request = save_request(api.db(), awaiting_payment("artist_1", "GOLD", ServiceCategory::Recording)).await;
        gateway.add_transaction(completed_transaction("cs_race", request.id, "artist_1", 29900));
        let calls = (0..8).map(|_| api.settle("cs_race"));
        let results = futures_util::future::join_all(calls).await;
        let results = results.into_iter().collect::<Result<Vec<_>, _>>().expect("all settlements should succeed");
        let project_id = results[0].project_id;
        assert!(results.iter().all(|r| r.project_id == project_id && r.status == SettlementStatus::Paid));
        assert_eq!(results.iter().filter(|r| r.is_newly_processed).count(), 1);
        assert_eq!(settlement_row_counts(api.db()).await, (1, 1, 0, 1));
        tear_down(api).await;
    }

    #[tokio::test]
    async fn missing_metadata_is_fatal() {
        let (api, gateway) = setup().await;
        let tx = completed_transaction("cs_no_meta", 1, "artist_1", 1000).with_metadata(TransactionMetadata::new());
        gateway.add_transaction(tx);
        let err = api.settle("cs_no_meta").await.unwrap_err();
        assert!(matches!(err, SettlementError::MissingMetadata(_)));
        assert!(err.is_fatal());
        assert_eq!(settlement_row_counts(api.db()).await, (0, 0, 0, 0));
        tear_down(api).await;
    }

    #[tokio::test]
    async fn unknown_request_and_unknown_tier() {
        let (api, gateway) = setup().await;
        gateway.add_transaction(completed_transaction("cs_ghost", 4040, "artist_1", 1000));
        let err = api.settle("cs_ghost").await.unwrap_err();
        assert!(matches!(err, SettlementError::RequestNotFound(4040)));

        let request = save_request(api.db(), awaiting_payment("artist_1", "PLATINUM", ServiceCategory::Mixing)).await;
        gateway.add_transaction(completed_transaction("cs_platinum", request.id, "artist_1", 1000));
        let err = api.settle("cs_platinum").await.unwrap_err();
        assert!(matches!(err, SettlementError::PolicyMissing(ref t) if t == "PLATINUM"));
        assert!(err.is_fatal());
        assert_eq!(settlement_row_counts(api.db()).await, (0, 0, 0, 0));
        let unchanged = api.db().fetch_service_request(request.id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, ServiceRequestStatus::AwaitingPayment);
        tear_down(api).await;
    }

    #[tokio::test]
    async fn cancelled_request_is_not_settled() {
        let (api, gateway) = setup().await;
        let request = save_request(api.db(), awaiting_payment("artist_1", "GOLD", ServiceCategory::Mixing)).await;
        set_request_status(api.db(), request.id, ServiceRequestStatus::Cancelled).await;
        gateway.add_transaction(completed_transaction("cs_cancelled", request.id, "artist_1", 1000));
        let err = api.settle("cs_cancelled").await.unwrap_err();
        match err {
            SettlementError::RequestCancelled { request_id, payment_reference } => {
                assert_eq!(request_id, request.id);
                assert_eq!(payment_reference, "pi_cs_cancelled");
            },
            e => panic!("Expected RequestCancelled, got {e}"),
        }
        assert_eq!(settlement_row_counts(api.db()).await, (0, 0, 0, 0));
        let unchanged = api.db().fetch_service_request(request.id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, ServiceRequestStatus::Cancelled);
        tear_down(api).await;
    }

    #[tokio::test]
    async fn gateway_failures_write_nothing() {
        let (api, gateway) = setup().await;
        let request = save_request(api.db(), awaiting_payment("artist_1", "GOLD", ServiceCategory::Mixing)).await;
        gateway.add_transaction(completed_transaction("cs_flaky", request.id, "artist_1", 1000));
        gateway.set_failure(Some(GatewayError::Timeout));
        let err = api.settle("cs_flaky").await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(settlement_row_counts(api.db()).await, (0, 0, 0, 0));
        gateway.set_failure(None);
        assert!(api.settle("cs_flaky").await.unwrap().is_newly_processed);

        let err = api.settle("cs_unknown").await.unwrap_err();
        assert!(matches!(err, SettlementError::Gateway(GatewayError::TransactionNotFound(_))));
        let err = api.settle("   ").await.unwrap_err();
        assert!(matches!(err, SettlementError::InvalidTransactionId(_)));
        assert_eq!(gateway.call_count(), 3);
        tear_down(api).await;
    }

    #[tokio::test]
    async fn recording_becomes_production_with_the_assigned_creator() {
        let (api, gateway) = setup().await;
        let request = awaiting_payment("artist_1", "BRONZE", ServiceCategory::Recording).with_creator("creator_3");
        let request = save_request(api.db(), request).await;
        gateway.add_transaction(completed_transaction("cs_rec", request.id, "artist_1", 9900));
        let result = api.settle("cs_rec").await.unwrap();
        let project_id = result.project_id.unwrap();
        let project = api.db().fetch_project(project_id).await.unwrap().unwrap();
        assert_eq!(project.project_type, ProjectCategory::Production);
        assert!(!project.stems_included);
        assert_eq!(project.revision_limit, 1);
        let assignment = api.db().fetch_service_assignment(project_id).await.unwrap().unwrap();
        assert_eq!(assignment.category, ProjectCategory::Production);
        assert_eq!(assignment.creator_id.as_deref(), Some("creator_3"));
        let entry = api.db().fetch_ledger_entry_for_transaction("cs_rec").await.unwrap().unwrap();
        assert_eq!(entry.platform_fee, Cents::from(1485));
        assert_eq!(entry.creator_amount, Cents::from(8415));
        tear_down(api).await;
    }

    #[tokio::test]
    async fn unknown_category_maps_to_mixing_without_a_creator() {
        let (api, gateway) = setup().await;
        let request = awaiting_payment("artist_1", "GOLD", ServiceCategory::from("VOCAL_TUNING"));
        let request = save_request(api.db(), request).await;
        gateway.add_transaction(completed_transaction("cs_vocal", request.id, "someone_else", 5000));
        let result = api.settle("cs_vocal").await.unwrap();
        let project_id = result.project_id.unwrap();
        let project = api.db().fetch_project(project_id).await.unwrap().unwrap();
        assert_eq!(project.project_type, ProjectCategory::Mixing);
        // the request owner wins over the metadata
        assert_eq!(project.owner_artist_id, "artist_1");
        let assignment = api.db().fetch_service_assignment(project_id).await.unwrap().unwrap();
        assert_eq!(assignment.creator_id, None);
        tear_down(api).await;
    }

    #[tokio::test]
    async fn tier_edits_do_not_touch_settled_records() {
        let (api, gateway) = setup().await;
        let request = save_request(api.db(), awaiting_payment("artist_1", "GOLD", ServiceCategory::Mixing)).await;
        gateway.add_transaction(completed_transaction("cs_snapshot", request.id, "artist_1", 32890));
        let project_id = api.settle("cs_snapshot").await.unwrap().project_id.unwrap();

        let mut edited = gold_tier();
        edited.number_of_revisions = 10;
        edited.commission_percentage = 50.0;
        edited.stems_allowance = 0;
        save_tier(api.db(), &edited).await;

        let project = api.db().fetch_project(project_id).await.unwrap().unwrap();
        assert_eq!(project.revision_limit, 3);
        assert!(project.stems_included);
        let entry = api.db().fetch_ledger_entry_for_request(request.id).await.unwrap().unwrap();
        assert_eq!(entry.platform_fee, Cents::from(3289));
        // settling again does not recompute anything either
        let again = api.settle("cs_snapshot").await.unwrap();
        assert_eq!(again.project_id, Some(project_id));
        let entry = api.db().fetch_ledger_entry_for_request(request.id).await.unwrap().unwrap();
        assert_eq!(entry.platform_fee, Cents::from(3289));
        tear_down(api).await;
    }

    #[tokio::test]
    async fn second_payment_for_a_settled_request_is_absorbed() {
        let (api, gateway) = setup().await;
        let request = save_request(api.db(), awaiting_payment("artist_1", "GOLD", ServiceCategory::Mixing)).await;
        gateway.add_transaction(completed_transaction("cs_first", request.id, "artist_1", 32890));
        gateway.add_transaction(completed_transaction("cs_second", request.id, "artist_1", 32890));
        let first = api.settle("cs_first").await.unwrap();
        let second = api.settle("cs_second").await.unwrap();
        assert_eq!(first.project_id, second.project_id);
        assert!(!second.is_newly_processed);
        assert_eq!(settlement_row_counts(api.db()).await, (1, 1, 0, 1));
        assert!(api.db().fetch_ledger_entry_for_transaction("cs_second").await.unwrap().is_none());
        assert_eq!(first.duplicate_payment_of, None);
        assert_eq!(second.duplicate_payment_of.as_deref(), Some("cs_first"));
        // reloading the first transaction's confirmation page is not a second payment
        let reload = api.settle("cs_first").await.unwrap();
        assert_eq!(reload.duplicate_payment_of, None);
        // the flag stays internal
        let json = serde_json::to_value(&second).unwrap();
        assert!(json.get("duplicatePaymentOf").is_none());
        tear_down(api).await;
    }
}
