pub mod activity_log;
pub mod db;
pub mod errors;
pub mod service;
pub mod user;
