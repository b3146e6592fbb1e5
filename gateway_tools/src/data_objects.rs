use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A checkout session, as returned by `GET /v1/checkout/sessions/{id}`.
///
/// Only the fields the settlement pipeline reads are modelled. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CheckoutSession {
    pub id: String,
    /// Lifecycle of the session itself: `open`, `complete` or `expired`.
    #[serde(default)]
    pub status: Option<String>,
    /// `paid`, `unpaid` or `no_payment_required`.
    pub payment_status: String,
    /// Total charged, in the currency's minor unit.
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub payment_intent: Option<PaymentIntentRef>,
    /// Free-form key/value pairs attached when the session was created.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Unix timestamp (seconds)
    #[serde(default)]
    pub created: Option<i64>,
}

impl CheckoutSession {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created.and_then(|ts| Utc.timestamp_opt(ts, 0).single())
    }

    /// The id of the underlying payment, whether the gateway returned it as a bare id or as an expanded object.
    pub fn payment_reference_id(&self) -> Option<&str> {
        self.payment_intent.as_ref().map(PaymentIntentRef::id)
    }
}

/// The gateway returns related objects either as a bare id or, when expanded, as the full object.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PaymentIntentRef {
    Id(String),
    Expanded { id: String },
}

impl PaymentIntentRef {
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Expanded { id } => id,
        }
    }
}
