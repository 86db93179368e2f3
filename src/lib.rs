//! File-backed credential store for login accounts.
//!
//! Each identity (a UUID) maps to one record file holding a display name, a
//! random salt and a salted SHA-256 password digest. Records are replaced by
//! atomic rename and mutations are serialized by a store-wide file lock.
//!
//! ## Modules
//! - `cli` — Command-line handlers
//! - `core` — Credential store, record codec, hashing, audit trail
//! - `models` — Serialized data structures
//! - `util` — Filesystem helpers

pub mod cli;
pub mod constants;
pub mod core;
pub mod error;
pub mod models;
pub mod util;

pub use crate::core::credstore::CredentialStore;
pub use crate::core::identity::Identity;
pub use crate::core::paths::StorePaths;
pub use crate::error::{StoreError, StoreResult};
