//! Accounts module: registration, login, admin user management and the
//! audit trail those admin operations append to.

pub mod domain;
pub mod repo;
pub mod repository;
pub mod service;

pub use service::AccountService;
