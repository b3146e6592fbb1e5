//! Value types shared by the settlement engine, the gateway client and the server.
mod cents;
mod helpers;

pub mod op;
mod secret;

pub use cents::{Cents, CentsConversionError, DEFAULT_CURRENCY_CODE};
pub use helpers::{parse_boolean_flag, parse_number_or};
pub use secret::Secret;
