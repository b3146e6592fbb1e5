use amp_settlement_engine::{GatewayError, GatewayTransaction, PaymentGateway};
use mockall::mock;

mock! {
    pub Gateway {}
    impl PaymentGateway for Gateway {
        async fn retrieve_transaction(&self, transaction_id: &str) -> Result<GatewayTransaction, GatewayError>;
    }
}
