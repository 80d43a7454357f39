//! HTTP layer: router, handlers, authentication middleware and startup.
//!
//! Handlers translate between the wire envelope and the business services;
//! everything with rules of its own lives in the `service` crate.

pub mod auth;
pub mod errors;
pub mod routes;
pub mod startup;

pub use startup::run;
