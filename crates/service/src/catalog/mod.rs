//! Catalog module: service records, nearby search, and the cache
//! invalidation discipline around their mutation pipeline.

pub mod domain;
pub mod repo;
pub mod repository;
pub mod service;

pub use service::CatalogService;
