//! Business layer for the nearby-services API.
//!
//! Two domain areas, each with the domain/repository/service split:
//! `catalog` (service records, nearby search, cache invalidation) and
//! `accounts` (users, roles, audit trail). `access`, `cache`, `geo` and
//! `throttle` are the shared leaves they build on.

pub mod access;
pub mod accounts;
pub mod cache;
pub mod catalog;
pub mod errors;
pub mod geo;
pub mod throttle;

pub use cache::ApiCache;
pub use errors::ServiceError;
pub use throttle::Throttle;
