//! Store path resolution and directory structure.

use crate::constants;
use crate::core::identity::Identity;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct StorePaths {
    pub root: PathBuf,
    pub records: PathBuf,
    pub config_toml: PathBuf,
    pub store_lock: PathBuf,
    pub audit_log: PathBuf,
}

impl StorePaths {
    /// Resolve store paths from CLI arg, env var, or the default data folder.
    pub fn resolve(root_arg: Option<PathBuf>) -> Self {
        if let Some(root) = root_arg {
            return Self::from_root(root);
        }
        match env::var(constants::STORE_ROOT_ENV) {
            Ok(root) if !root.trim().is_empty() => Self::from_root(PathBuf::from(root)),
            _ => Self::from_root(PathBuf::from(constants::DEFAULT_STORE_ROOT)),
        }
    }

    pub fn from_root(root: PathBuf) -> Self {
        Self {
            records: root.join("records"),
            config_toml: root.join("login-vault.toml"),
            store_lock: root.join("store.lock"),
            audit_log: root.join("audit.log"),
            root,
        }
    }

    /// Location of the credential record for `identity`.
    pub fn record(&self, identity: &Identity) -> PathBuf {
        self.records.join(identity.record_file_name())
    }
}

impl std::fmt::Display for StorePaths {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "store@{}", self.root.display())
    }
}
