use std::time::Duration;

use amp_common::{parse_number_or, Secret};
use log::*;

const DEFAULT_GATEWAY_API_URL: &str = "https://api.stripe.com";
const DEFAULT_GATEWAY_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Scheme and host of the gateway REST API, without a trailing slash. e.g. "https://api.stripe.com"
    pub api_url: String,
    pub secret_key: Secret<String>,
    /// Upper bound on a single gateway round trip. A request that exceeds it fails with a transient error.
    pub timeout: Duration,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_GATEWAY_API_URL.to_string(),
            secret_key: Secret::default(),
            timeout: Duration::from_millis(DEFAULT_GATEWAY_TIMEOUT_MS),
        }
    }
}

impl CheckoutConfig {
    pub fn new(api_url: &str, secret_key: &str) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            secret_key: Secret::new(secret_key.to_string()),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("AMP_GATEWAY_API_URL").unwrap_or_else(|_| {
            warn!("🌐️ AMP_GATEWAY_API_URL not set, using {DEFAULT_GATEWAY_API_URL} as default");
            DEFAULT_GATEWAY_API_URL.to_string()
        });
        let secret_key = Secret::new(std::env::var("AMP_GATEWAY_SECRET_KEY").unwrap_or_else(|_| {
            error!("🌐️ AMP_GATEWAY_SECRET_KEY is not set. Gateway requests will be rejected.");
            String::default()
        }));
        let timeout_ms = parse_number_or(std::env::var("AMP_GATEWAY_TIMEOUT_MS").ok(), DEFAULT_GATEWAY_TIMEOUT_MS);
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            secret_key,
            timeout: Duration::from_millis(timeout_ms),
        }
    }
}
