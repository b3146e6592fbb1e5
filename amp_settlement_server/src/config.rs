use std::{env, time::Duration};

use amp_common::{parse_boolean_flag, parse_number_or};
use amp_settlement_engine::sqlite::db::{db_url, DEFAULT_BUSY_TIMEOUT};
use gateway_tools::CheckoutConfig;
use log::*;

const DEFAULT_AMP_HOST: &str = "127.0.0.1";
const DEFAULT_AMP_PORT: u16 = 8370;
const DEFAULT_MAX_CONNECTIONS: u32 = 25;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Size of the store connection pool. Every in-flight settlement holds one connection while it commits.
    pub max_connections: u32,
    /// How long a writer waits for the SQLite write lock before giving up with a (retryable) store error.
    pub busy_timeout: Duration,
    /// If true, the embedded migrations are applied when the server starts.
    pub run_migrations: bool,
    /// Checkout gateway client configuration. Holds the gateway secret key.
    pub gateway: CheckoutConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_AMP_HOST.to_string(),
            port: DEFAULT_AMP_PORT,
            database_url: String::default(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            run_migrations: true,
            gateway: CheckoutConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("AMP_HOST").ok().unwrap_or_else(|| DEFAULT_AMP_HOST.into());
        let port = env::var("AMP_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for AMP_PORT. {e} Using the default, {DEFAULT_AMP_PORT}, instead."
                    );
                    DEFAULT_AMP_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_AMP_PORT);
        let database_url = db_url();
        let max_connections = match parse_number_or(env::var("AMP_DB_MAX_CONNECTIONS").ok(), DEFAULT_MAX_CONNECTIONS) {
            0 => {
                error!("🪛️ AMP_DB_MAX_CONNECTIONS must be at least 1. Using {DEFAULT_MAX_CONNECTIONS} instead.");
                DEFAULT_MAX_CONNECTIONS
            },
            n => n,
        };
        let busy_timeout_ms =
            parse_number_or(env::var("AMP_DB_BUSY_TIMEOUT_MS").ok(), DEFAULT_BUSY_TIMEOUT.as_millis() as u64);
        let run_migrations = parse_boolean_flag(env::var("AMP_RUN_MIGRATIONS").ok(), true);
        let gateway = CheckoutConfig::new_from_env_or_default();
        Self {
            host,
            port,
            database_url,
            max_connections,
            busy_timeout: Duration::from_millis(busy_timeout_ms),
            run_migrations,
            gateway,
        }
    }
}
