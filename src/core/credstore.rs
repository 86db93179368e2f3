//! The credential store: one record file per identity under `records/`.
//!
//! Mutations (`register`, `change_password`, `delete_account`) are serialized
//! store-wide by an exclusive flock on `store.lock`. Reads take no lock; every
//! record write is a temp-file rename, so a reader sees either the previous
//! record or the complete new one.

use crate::constants;
use crate::core::audit_log::{self, AuditAction};
use crate::core::file_lock::FileLock;
use crate::core::hashing;
use crate::core::identity::Identity;
use crate::core::paths::StorePaths;
use crate::core::record::{self, DecodedRecord};
use crate::error::{StoreError, StoreResult};
use crate::util::fs::{self as store_fs, Replace};
use std::fs;
use std::io;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub struct CredentialStore {
    paths: StorePaths,
    audit: bool,
}

impl CredentialStore {
    /// Open the store at `paths`, creating the records directory if absent.
    pub fn open(paths: StorePaths) -> StoreResult<Self> {
        store_fs::ensure_dir(&paths.records, constants::RECORDS_DIR_MODE).map_err(|e| {
            StoreError::storage(format!("create records dir {}", paths.records.display()), e)
        })?;
        debug!(store = %paths, "credential store opened");
        Ok(Self { paths, audit: true })
    }

    /// Enable or disable the audit trail (enabled by default).
    pub fn with_audit(mut self, enabled: bool) -> Self {
        self.audit = enabled;
        self
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    pub fn is_registered(&self, identity: &Identity) -> bool {
        self.paths.record(identity).is_file()
    }

    pub fn register(&self, identity: &Identity, display_name: &str, password: &str) -> StoreResult<()> {
        let _lock = self.lock()?;
        let result = self.register_locked(identity, display_name, password);
        self.audit(AuditAction::Register, identity, &result);
        if result.is_ok() {
            info!(%identity, "registered");
        }
        result
    }

    fn register_locked(&self, identity: &Identity, display_name: &str, password: &str) -> StoreResult<()> {
        if password.is_empty() {
            return Err(StoreError::EmptyPassword);
        }
        let path = self.paths.record(identity);
        if path.exists() {
            return Err(StoreError::AlreadyRegistered(*identity));
        }
        let rec = DecodedRecord::new(display_name, hashing::generate_salt(), password);
        record::save(&path, &rec, Replace::CreateNew).map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => StoreError::AlreadyRegistered(*identity),
            _ => StoreError::storage(format!("write record {}", path.display()), e),
        })
    }

    /// True only if a record exists and `password` matches it. Never fails:
    /// unreadable or corrupt records count as a mismatch.
    pub fn verify(&self, identity: &Identity, password: &str) -> bool {
        let path = self.paths.record(identity);
        match record::load(&path) {
            Ok(rec) => {
                let ok = rec.matches(password);
                debug!(%identity, ok, "verify");
                ok
            }
            Err(StoreError::Storage { ref source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                debug!(%identity, "verify: not registered");
                false
            }
            Err(e) => {
                warn!(%identity, error = %e, "verify: cannot read credential record");
                false
            }
        }
    }

    pub fn change_password(&self, identity: &Identity, new_password: &str) -> StoreResult<()> {
        let _lock = self.lock()?;
        let result = self.change_password_locked(identity, new_password);
        self.audit(AuditAction::ChangePassword, identity, &result);
        if result.is_ok() {
            info!(%identity, "password changed");
        }
        result
    }

    fn change_password_locked(&self, identity: &Identity, new_password: &str) -> StoreResult<()> {
        if new_password.is_empty() {
            return Err(StoreError::EmptyPassword);
        }
        let path = self.paths.record(identity);
        let current = match record::load(&path) {
            Ok(rec) => rec,
            Err(StoreError::Storage { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotRegistered(*identity));
            }
            Err(e) => return Err(e),
        };
        let salt = hashing::generate_salt_excluding(&current.salt);
        let updated = DecodedRecord::new(&current.name, salt, new_password);
        record::save(&path, &updated, Replace::Overwrite)
            .map_err(|e| StoreError::storage(format!("write record {}", path.display()), e))
    }

    pub fn delete_account(&self, identity: &Identity) -> StoreResult<()> {
        let _lock = self.lock()?;
        let result = self.delete_locked(identity);
        self.audit(AuditAction::Delete, identity, &result);
        if result.is_ok() {
            info!(%identity, "account deleted");
        }
        result
    }

    fn delete_locked(&self, identity: &Identity) -> StoreResult<()> {
        let path = self.paths.record(identity);
        match fs::remove_file(&path) {
            Ok(()) => {
                store_fs::sync_dir(&self.paths.records);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StoreError::NotRegistered(*identity)),
            Err(e) => Err(StoreError::storage(format!("remove record {}", path.display()), e)),
        }
    }

    /// Lock failures are logged but not audited: appends need the lock too.
    fn lock(&self) -> StoreResult<FileLock> {
        let lock = FileLock::exclusive(&self.paths.store_lock).map_err(|e| {
            warn!(lock = %self.paths.store_lock.display(), error = %e, "cannot acquire store lock");
            StoreError::storage(format!("acquire lock {}", self.paths.store_lock.display()), e)
        })?;
        debug!(lock = %self.paths.store_lock.display(), "store lock acquired");
        Ok(lock)
    }

    fn audit(&self, action: AuditAction, identity: &Identity, result: &StoreResult<()>) {
        if !self.audit {
            return;
        }
        if let Err(e) = audit_log::append(&self.paths, action, identity, result.as_ref().copied()) {
            warn!(%identity, %action, error = %e, "audit log write failed");
        }
    }
}
