use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use amp_settlement_engine::{events::EventProducers, ProjectsApi, SettlementApi, SqliteDatabase};
use log::*;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    integrations::{checkout::CheckoutGateway, funded_projects::create_funded_project_handlers},
    routes::{health, PaymentForRequestRoute, ProjectForRequestRoute, TiersRoute, VerifySettlementRoute},
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_options(&config.database_url, config.max_connections, config.busy_timeout)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.run_migrations {
        info!("💻️ Running store migrations");
        db.run_migrations().await.map_err(|e| ServerError::InitializeError(format!("Migrations failed. {e}")))?;
    }
    if config.gateway.secret_key.is_empty() {
        warn!("💻️ No gateway secret key is configured. Every settlement will fail until AMP_GATEWAY_SECRET_KEY is set.");
    }
    let gateway =
        CheckoutGateway::new(config.gateway.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = create_funded_project_handlers();
    let producers = handlers.producers();
    handlers.start_handlers();
    let srv = create_server_instance(config, db, gateway, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: CheckoutGateway,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let settlement_api = SettlementApi::new(db.clone(), gateway.clone(), producers.clone());
        let projects_api = ProjectsApi::new(db.clone());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("amp::access_log"))
            .app_data(web::Data::new(settlement_api))
            .app_data(web::Data::new(projects_api))
            .service(health)
            .service(VerifySettlementRoute::<SqliteDatabase, CheckoutGateway>::new())
            .service(ProjectForRequestRoute::<SqliteDatabase>::new())
            .service(PaymentForRequestRoute::<SqliteDatabase>::new())
            .service(TiersRoute::<SqliteDatabase>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
