use amp_settlement_engine::{
    db_types::ServiceCategory,
    test_utils::{
        mock_gateway::transaction_with_status,
        seed::{awaiting_payment, save_request, save_tier, tier},
    },
    GatewayPaymentStatus,
};
use cucumber::given;

use crate::cucumber::{SettlementSystem, SettlementWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut SettlementWorld) {
    world.system = Some(SettlementSystem::new().await);
}

#[given(expr = "a tier {word} priced at {int} with {int} revisions, {int} stems, {int} delivery days and {float}% commission")]
async fn tier_policy(
    world: &mut SettlementWorld,
    label: String,
    price: i64,
    revisions: i64,
    stems: i64,
    days: i64,
    pct: f64,
) {
    save_tier(world.system().db(), &tier(&label, price, revisions, stems, days, pct)).await;
}

#[given(expr = "a {word} service request {string} from artist {string} on tier {word}")]
async fn service_request(world: &mut SettlementWorld, category: String, alias: String, artist: String, tier: String) {
    let sys = world.system();
    let request = save_request(sys.db(), awaiting_payment(&artist, &tier, ServiceCategory::from(category))).await;
    sys.requests.insert(alias, request);
}

#[given(expr = "the gateway has a {word} checkout {string} for {string} of {int} cents")]
async fn checkout(world: &mut SettlementWorld, status: String, txid: String, alias: String, cents: i64) {
    let status = match status.as_str() {
        "completed" => GatewayPaymentStatus::Completed,
        "pending" => GatewayPaymentStatus::Pending,
        "failed" => GatewayPaymentStatus::Failed,
        s => panic!("Unknown checkout status {s}"),
    };
    let sys = world.system();
    let request = sys.request(&alias);
    let tx = transaction_with_status(&txid, request.id, &request.owner_artist_id, cents, status);
    sys.gateway.add_transaction(tx);
}
