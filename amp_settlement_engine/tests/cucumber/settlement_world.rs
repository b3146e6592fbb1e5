use std::collections::HashMap;

use amp_settlement_engine::{
    db_types::ServiceRequest,
    events::EventProducers,
    test_utils::{mock_gateway::MockGateway, prepare_env::fresh_database},
    SettlementApi,
    SettlementDatabase,
    SettlementError,
    SettlementResult,
    SqliteDatabase,
};
use cucumber::World;

#[derive(Default, Debug, World)]
pub struct SettlementWorld {
    pub system: Option<SettlementSystem>,
}

#[derive(Debug)]
pub struct SettlementSystem {
    pub db_url: String,
    pub api: SettlementApi<SqliteDatabase, MockGateway>,
    pub gateway: MockGateway,
    /// Service requests, by the alias used in the feature file
    pub requests: HashMap<String, ServiceRequest>,
    pub results: Vec<Result<SettlementResult, SettlementError>>,
}

impl SettlementWorld {
    pub fn system(&mut self) -> &mut SettlementSystem {
        self.system.as_mut().expect("Settlement system not initialised")
    }
}

impl SettlementSystem {
    pub async fn new() -> Self {
        let db = fresh_database(4).await;
        let db_url = db.url().to_string();
        let gateway = MockGateway::new().with_latency(std::time::Duration::from_millis(1));
        let api = SettlementApi::new(db, gateway.clone(), EventProducers::default());
        Self { db_url, api, gateway, requests: HashMap::new(), results: vec![] }
    }

    pub fn db(&self) -> &SqliteDatabase {
        self.api.db()
    }

    pub fn request(&self, alias: &str) -> &ServiceRequest {
        self.requests.get(alias).unwrap_or_else(|| panic!("Unknown service request '{alias}'"))
    }

    pub fn request_id(&self, alias: &str) -> i64 {
        self.request(alias).id
    }

    pub fn last_result(&self) -> &Result<SettlementResult, SettlementError> {
        self.results.last().expect("Nothing has been settled yet")
    }
}
