//! # Settlement server
//! This crate hosts the HTTP front end for the settlement engine. It is responsible for:
//! * Answering settlement verification calls from the artist's confirmation page and from the gateway callback.
//! * Adapting the checkout gateway client to the engine's `PaymentGateway` contract.
//! * Read-only views of settled projects, recorded payments and tier policies.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/settlement/verify?transaction={id}`: Settles the checkout transaction, if it has been paid, and reports the
//!   outcome. Safe to call repeatedly.
//! * `/requests/{id}/project`: The project created from a service request.
//! * `/requests/{id}/payment`: The payment ledger entry for a service request.
//! * `/tiers`: The tier policies.
pub mod cli;
pub mod config;
pub mod errors;
pub mod integrations;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
