use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
    StatusCode,
};
use serde::de::DeserializeOwned;

use crate::{config::CheckoutConfig, helpers::is_valid_object_id, CheckoutApiError, CheckoutSession};

#[derive(Clone)]
pub struct CheckoutApi {
    config: CheckoutConfig,
    client: Arc<Client>,
}

impl CheckoutApi {
    pub fn new(config: CheckoutConfig) -> Result<Self, CheckoutApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        let mut val = HeaderValue::from_str(&format!("Bearer {}", config.secret_key.reveal()))
            .map_err(|e| CheckoutApiError::Initialization(e.to_string()))?;
        val.set_sensitive(true);
        headers.insert(AUTHORIZATION, val);
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| CheckoutApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/v1{path}", self.config.api_url)
    }

    pub async fn rest_get<T: DeserializeOwned>(&self, path: &str) -> Result<T, CheckoutApiError> {
        let url = self.url(path);
        trace!("🌐️ Sending REST query: {url}");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status.is_success() {
            trace!("🌐️ REST query successful. {status}");
            response.json::<T>().await.map_err(|e| CheckoutApiError::JsonError(e.to_string()))
        } else {
            let message = response.text().await?;
            Err(CheckoutApiError::QueryError { status: status.as_u16(), message })
        }
    }

    /// Fetches a checkout session by id. This is a read-only call and is safe to repeat.
    pub async fn get_session(&self, session_id: &str) -> Result<CheckoutSession, CheckoutApiError> {
        if !is_valid_object_id(session_id) {
            return Err(CheckoutApiError::InvalidSessionId(session_id.to_string()));
        }
        let path = format!("/checkout/sessions/{session_id}");
        debug!("🌐️ Fetching checkout session {session_id}");
        let session = self.rest_get::<CheckoutSession>(&path).await.map_err(|e| match e {
            CheckoutApiError::QueryError { status, .. } if status == StatusCode::NOT_FOUND.as_u16() => {
                CheckoutApiError::SessionNotFound(session_id.to_string())
            },
            e => e,
        })?;
        debug!("🌐️ Checkout session {session_id} has payment status '{}'", session.payment_status);
        Ok(session)
    }
}
