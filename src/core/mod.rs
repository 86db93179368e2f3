//! Core business logic modules.

pub mod audit_log;
pub mod config;
pub mod credstore;
pub mod file_lock;
pub mod hashing;
pub mod identity;
pub mod paths;
pub mod record;
