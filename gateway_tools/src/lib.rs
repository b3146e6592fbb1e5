//! # Gateway tools
//!
//! A thin REST client for the external checkout gateway. The settlement pipeline only ever *reads* from the gateway:
//! it retrieves a checkout session by id and inspects its payment status, amount and metadata.
//!
//! The types in this crate mirror the gateway's wire format. Converting them into the settlement engine's typed
//! transaction is the job of the server's integration layer.
mod api;
mod config;
mod data_objects;
mod error;

pub mod helpers;

pub use api::CheckoutApi;
pub use config::CheckoutConfig;
pub use data_objects::{CheckoutSession, PaymentIntentRef};
pub use error::CheckoutApiError;
