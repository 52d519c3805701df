//! # Ride dispatch server
//! This module hosts the HTTP surface of the ride dispatch service. It is responsible for:
//! routing and session authentication for the rider app, the chair app and owners,
//! translating engine results and errors onto the wire,
//! and driving the two background cadences (coordinate batch flush, matching pass).
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
pub mod app_routes;
pub mod auth;
pub mod chair_routes;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod owner_routes;
pub mod payment_gateway;
pub mod routes;
pub mod server;
pub mod workers;

#[cfg(test)]
mod endpoint_tests;
