//! Credential record encoding and atomic persistence.

use crate::constants;
use crate::core::hashing::{self, PasswordHash, Salt};
use crate::error::{StoreError, StoreResult};
use crate::models::credential::CredentialRecord;
use crate::util::fs::{self as store_fs, Replace};
use std::fs;
use std::io;
use std::path::Path;

/// A record whose salt and hash have been decoded and length-checked.
#[derive(Debug, Clone)]
pub struct DecodedRecord {
    pub name: String,
    pub salt: Salt,
    pub hash: PasswordHash,
}

impl DecodedRecord {
    pub fn new(name: &str, salt: Salt, password: &str) -> Self {
        Self {
            name: name.to_string(),
            hash: hashing::hash_password(&salt, password),
            salt,
        }
    }

    fn encode(&self) -> CredentialRecord {
        CredentialRecord {
            name: self.name.clone(),
            salt: hashing::encode(&self.salt),
            hash: hashing::encode(&self.hash),
        }
    }

    fn decode(record: CredentialRecord) -> Result<Self, String> {
        let salt = hashing::decode(&record.salt).map_err(|e| format!("salt: {}", e))?;
        let salt: Salt = salt
            .try_into()
            .map_err(|v: Vec<u8>| format!("salt: expected {} bytes, got {}", constants::SALT_LEN, v.len()))?;
        let hash = hashing::decode(&record.hash).map_err(|e| format!("hash: {}", e))?;
        let hash: PasswordHash = hash
            .try_into()
            .map_err(|v: Vec<u8>| format!("hash: expected 32 bytes, got {}", v.len()))?;
        Ok(Self {
            name: record.name,
            salt,
            hash,
        })
    }

    /// Whether `password` hashes to the stored digest under the stored salt.
    pub fn matches(&self, password: &str) -> bool {
        let candidate = hashing::hash_password(&self.salt, password);
        hashing::constant_time_eq(&candidate, &self.hash)
    }
}

/// Parse record text. Unknown or missing keys and bad encodings are corruption.
pub fn parse(path: &Path, content: &str) -> StoreResult<DecodedRecord> {
    let raw: CredentialRecord = toml::from_str(content).map_err(|e| StoreError::Corrupt {
        path: path.to_path_buf(),
        reason: e.message().to_string(),
    })?;
    DecodedRecord::decode(raw).map_err(|reason| StoreError::Corrupt {
        path: path.to_path_buf(),
        reason,
    })
}

/// Read and decode the record at `path`. A missing file is an `io::ErrorKind::NotFound` storage error.
pub fn load(path: &Path) -> StoreResult<DecodedRecord> {
    let content = fs::read_to_string(path)
        .map_err(|e| StoreError::storage(format!("read record {}", path.display()), e))?;
    parse(path, &content)
}

pub fn render(record: &DecodedRecord) -> Result<String, toml::ser::Error> {
    toml::to_string(&record.encode())
}

/// Atomically write `record` to `path`.
pub fn save(path: &Path, record: &DecodedRecord, replace: Replace) -> io::Result<()> {
    let content = render(record).map_err(io::Error::other)?;
    store_fs::write_atomic(
        path,
        content.as_bytes(),
        constants::RECORD_FILE_MODE,
        constants::TEMP_RECORD_PREFIX,
        replace,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample(name: &str) -> DecodedRecord {
        DecodedRecord::new(name, [9u8; constants::SALT_LEN], "pw")
    }

    #[test]
    fn test_rendered_layout_is_three_key_value_lines() {
        let text = render(&sample("Steve")).unwrap();
        let keys: Vec<&str> = text
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| l.split('=').next().unwrap().trim())
            .collect();
        assert_eq!(keys, vec!["name", "salt", "hash"]);
    }

    #[test]
    fn test_awkward_display_name_survives_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("r.toml");
        let name = "na=me \"quoted\"\nsecond line \\ ünï";
        save(&path, &sample(name), Replace::CreateNew).unwrap();
        let loaded = load(&path).unwrap();
        assert_eq!(loaded.name, name);
        assert!(loaded.matches("pw"));
        assert!(!loaded.matches("PW"));
    }

    #[test]
    fn test_missing_key_is_corrupt() {
        let err = parse(Path::new("x.toml"), "name = \"a\"\nsalt = \"AAAA\"\n").unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn test_unknown_key_is_corrupt() {
        let mut text = render(&sample("a")).unwrap();
        text.push_str("extra = \"1\"\n");
        assert!(matches!(
            parse(Path::new("x.toml"), &text),
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_wrong_salt_length_is_corrupt() {
        let text = format!(
            "name = \"a\"\nsalt = \"{}\"\nhash = \"{}\"\n",
            hashing::encode(&[1u8; 8]),
            hashing::encode(&[0u8; 32])
        );
        let err = parse(Path::new("x.toml"), &text).unwrap_err();
        assert!(err.to_string().contains("salt"));
    }

    #[test]
    fn test_load_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        match load(&dir.path().join("absent.toml")) {
            Err(StoreError::Storage { source, .. }) => {
                assert_eq!(source.kind(), io::ErrorKind::NotFound)
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
