//! Append-only, hash-chained audit trail of account mutations.
//!
//! Entries carry the identity and outcome only. Passwords, salts and digests
//! never reach this file.

use crate::constants;
use crate::core::identity::Identity;
use crate::core::paths::StorePaths;
use crate::error::StoreError;
use crate::util::fs as store_fs;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;

const TAIL_CHUNK: u64 = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Register,
    ChangePassword,
    Delete,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AuditAction::Register => "register",
            AuditAction::ChangePassword => "change_password",
            AuditAction::Delete => "delete",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub action: AuditAction,
    pub identity: Identity,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_hash: Option<String>,
}

/// Append an entry for a finished mutation. Callers must hold the store lock.
pub fn append(
    paths: &StorePaths,
    action: AuditAction,
    identity: &Identity,
    outcome: Result<(), &StoreError>,
) -> Result<()> {
    let prev_hash = last_entry_hash(&paths.audit_log)?;
    let mut entry = AuditEntry {
        timestamp: Utc::now(),
        action,
        identity: *identity,
        success: outcome.is_ok(),
        error: outcome.err().map(|e| e.kind().to_string()),
        prev_hash,
        entry_hash: None,
    };
    entry.entry_hash = Some(compute_entry_hash(&entry)?);

    let line = serde_json::to_string(&entry).context("serialize audit entry")?;
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&paths.audit_log)
        .with_context(|| format!("open audit log {}", paths.audit_log.display()))?;
    writeln!(file, "{}", line).context("write audit entry")?;
    store_fs::set_permissions(&paths.audit_log, constants::AUDIT_LOG_MODE)
        .context("set audit log permissions")?;
    Ok(())
}

/// Hash over canonical JSON of the entry, excluding `entry_hash` itself.
fn compute_entry_hash(entry: &AuditEntry) -> Result<String> {
    let mut value = serde_json::to_value(entry).context("serialize for hash")?;
    if let Some(obj) = value.as_object_mut() {
        obj.remove("entry_hash");
    }
    let canonical = serde_json::to_string(&canonicalize(&value)).context("serialize canonical json")?;
    Ok(format!("{:064x}", Sha256::digest(canonical.as_bytes())))
}

fn canonicalize(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = serde_json::Map::new();
            for k in keys {
                out.insert(k.clone(), canonicalize(&map[k]));
            }
            serde_json::Value::Object(out)
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(canonicalize).collect())
        }
        other => other.clone(),
    }
}

/// Chain value of one log line: its `entry_hash`, or SHA-256 of the raw line
/// when it does not parse or carries none.
fn line_hash(line: &str) -> String {
    match serde_json::from_str::<AuditEntry>(line) {
        Ok(AuditEntry {
            entry_hash: Some(hash),
            ..
        }) => hash,
        _ => format!("{:064x}", Sha256::digest(line.as_bytes())),
    }
}

/// Hash of the last non-blank line, reading backwards from the end in chunks.
fn last_entry_hash(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let mut file = fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
    let len = file
        .metadata()
        .with_context(|| format!("stat {}", path.display()))?
        .len();

    let mut offset = len;
    let mut buf = Vec::new();
    while offset > 0 {
        let read_size = TAIL_CHUNK.min(offset);
        offset -= read_size;
        file.seek(SeekFrom::Start(offset))
            .with_context(|| format!("seek {}", path.display()))?;
        let mut chunk = vec![0u8; read_size as usize];
        file.read_exact(&mut chunk)
            .with_context(|| format!("read {}", path.display()))?;
        buf.splice(0..0, chunk);

        let mut lines = buf.split(|b| *b == b'\n');
        // the first segment may start mid-line until the file start is reached
        if offset > 0 {
            lines.next();
        }
        let last = lines
            .rev()
            .map(String::from_utf8_lossy)
            .find(|line| !line.trim().is_empty());
        if let Some(line) = last {
            return Ok(Some(line_hash(line.trim())));
        }
    }
    Ok(None)
}

/// Read audit entries, keeping the newest `limit` if given. Malformed lines are skipped.
pub fn read_log(paths: &StorePaths, limit: Option<usize>) -> Result<Vec<AuditEntry>> {
    if !paths.audit_log.exists() {
        return Ok(Vec::new());
    }
    let file = fs::File::open(&paths.audit_log)
        .with_context(|| format!("open audit log {}", paths.audit_log.display()))?;
    let mut entries = Vec::new();
    let mut malformed = 0usize;
    for line in BufReader::new(file).lines() {
        let line = line.context("read audit log line")?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<AuditEntry>(trimmed) {
            Ok(entry) => entries.push(entry),
            Err(_) => malformed += 1,
        }
    }
    if malformed > 0 {
        tracing::warn!(malformed, "skipped malformed audit entries");
    }
    if let Some(limit) = limit {
        if entries.len() > limit {
            entries = entries.split_off(entries.len() - limit);
        }
    }
    Ok(entries)
}

/// Verify the hash chain. Returns (total entries, errors).
pub fn verify_chain(paths: &StorePaths) -> Result<(usize, Vec<String>)> {
    if !paths.audit_log.exists() {
        return Ok((0, Vec::new()));
    }
    let file = fs::File::open(&paths.audit_log)
        .with_context(|| format!("open audit log {}", paths.audit_log.display()))?;
    let mut errors = Vec::new();
    let mut prev: Option<String> = None;
    let mut total = 0usize;

    for line in BufReader::new(file).lines() {
        let line = line.context("read audit log line")?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        total += 1;
        let entry = match serde_json::from_str::<AuditEntry>(trimmed) {
            Ok(entry) => entry,
            Err(e) => {
                errors.push(format!("entry {}: unparseable ({})", total, e));
                prev = Some(line_hash(trimmed));
                continue;
            }
        };
        if entry.prev_hash != prev {
            errors.push(format!(
                "entry {}: prev_hash mismatch (expected {:?}, got {:?})",
                total, prev, entry.prev_hash
            ));
        }
        match &entry.entry_hash {
            Some(stored) => {
                if &compute_entry_hash(&entry)? != stored {
                    errors.push(format!("entry {}: entry_hash mismatch (tampered?)", total));
                }
            }
            None => errors.push(format!("entry {}: missing entry_hash", total)),
        }
        prev = Some(line_hash(trimmed));
    }
    Ok((total, errors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_paths() -> (TempDir, StorePaths) {
        let dir = TempDir::new().unwrap();
        let paths = StorePaths::from_root(dir.path().to_path_buf());
        (dir, paths)
    }

    #[test]
    fn test_append_and_read() {
        let (_dir, paths) = test_paths();
        let id = Identity::new_random();
        append(&paths, AuditAction::Register, &id, Ok(())).unwrap();
        let failure = StoreError::NotRegistered(id);
        append(&paths, AuditAction::Delete, &id, Err(&failure)).unwrap();

        let entries = read_log(&paths, None).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, AuditAction::Register);
        assert!(entries[0].success);
        assert!(entries[0].prev_hash.is_none());
        assert!(!entries[1].success);
        assert_eq!(entries[1].error.as_deref(), Some("not_registered"));
        assert_eq!(entries[1].prev_hash, entries[0].entry_hash);
    }

    #[test]
    fn test_read_limit_keeps_newest() {
        let (_dir, paths) = test_paths();
        let id = Identity::new_random();
        append(&paths, AuditAction::Register, &id, Ok(())).unwrap();
        append(&paths, AuditAction::ChangePassword, &id, Ok(())).unwrap();
        append(&paths, AuditAction::Delete, &id, Ok(())).unwrap();
        let entries = read_log(&paths, Some(1)).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::Delete);
    }

    #[test]
    fn test_verify_chain_valid() {
        let (_dir, paths) = test_paths();
        let id = Identity::new_random();
        append(&paths, AuditAction::Register, &id, Ok(())).unwrap();
        append(&paths, AuditAction::ChangePassword, &id, Ok(())).unwrap();
        let (total, errors) = verify_chain(&paths).unwrap();
        assert_eq!(total, 2);
        assert!(errors.is_empty(), "errors: {:?}", errors);
    }

    #[test]
    fn test_verify_chain_detects_tamper() {
        let (_dir, paths) = test_paths();
        let id = Identity::new_random();
        append(&paths, AuditAction::Register, &id, Ok(())).unwrap();
        append(&paths, AuditAction::ChangePassword, &id, Ok(())).unwrap();

        let content = fs::read_to_string(&paths.audit_log).unwrap();
        fs::write(&paths.audit_log, content.replace("change_password", "delete")).unwrap();

        let (total, errors) = verify_chain(&paths).unwrap();
        assert_eq!(total, 2);
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_append_after_multi_chunk_log() {
        let (_dir, paths) = test_paths();
        let id = Identity::new_random();
        while fs::metadata(&paths.audit_log).map(|m| m.len()).unwrap_or(0) < 3 * TAIL_CHUNK {
            append(&paths, AuditAction::ChangePassword, &id, Ok(())).unwrap();
        }
        let before = read_log(&paths, None).unwrap();
        assert_eq!(
            last_entry_hash(&paths.audit_log).unwrap(),
            before.last().unwrap().entry_hash
        );

        append(&paths, AuditAction::Delete, &id, Ok(())).unwrap();
        let after = read_log(&paths, Some(2)).unwrap();
        assert_eq!(after[1].prev_hash, after[0].entry_hash);
        let (total, errors) = verify_chain(&paths).unwrap();
        assert_eq!(total, before.len() + 1);
        assert!(errors.is_empty(), "errors: {:?}", errors);
    }

    #[test]
    fn test_last_hash_of_long_raw_line_spanning_chunks() {
        let (_dir, paths) = test_paths();
        append(&paths, AuditAction::Register, &Identity::new_random(), Ok(())).unwrap();
        let garbage = "x".repeat(3 * TAIL_CHUNK as usize);
        let mut content = fs::read_to_string(&paths.audit_log).unwrap();
        content.push_str(&garbage);
        content.push_str("\n\n");
        fs::write(&paths.audit_log, content).unwrap();

        assert_eq!(
            last_entry_hash(&paths.audit_log).unwrap(),
            Some(format!("{:064x}", Sha256::digest(garbage.as_bytes())))
        );
    }

    #[test]
    fn test_last_hash_of_empty_log() {
        let (_dir, paths) = test_paths();
        fs::write(&paths.audit_log, "\n  \n").unwrap();
        assert_eq!(last_entry_hash(&paths.audit_log).unwrap(), None);
    }

    #[test]
    fn test_entries_carry_no_secrets() {
        let (_dir, paths) = test_paths();
        append(&paths, AuditAction::Register, &Identity::new_random(), Ok(())).unwrap();
        let content = fs::read_to_string(&paths.audit_log).unwrap();
        assert!(!content.contains("salt"));
        assert!(!content.contains("\"hash\""));
    }
}
