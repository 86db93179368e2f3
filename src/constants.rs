//! Centralized constants for permissions, paths, and record layout.

/// Default store root, relative to the working directory.
pub const DEFAULT_STORE_ROOT: &str = "login-vault";

/// Environment variable overriding the store root.
pub const STORE_ROOT_ENV: &str = "LOGIN_VAULT_ROOT";

/// Permission mode for the records directory.
pub const RECORDS_DIR_MODE: u32 = 0o700;

/// Permission mode for individual record files.
pub const RECORD_FILE_MODE: u32 = 0o600;

/// Permission mode for the configuration file.
pub const CONFIG_FILE_MODE: u32 = 0o640;

/// Permission mode for the audit log.
pub const AUDIT_LOG_MODE: u32 = 0o640;

/// File extension for credential records.
pub const RECORD_EXTENSION: &str = ".toml";

/// Prefix for in-flight temp files inside the records directory.
pub const TEMP_RECORD_PREFIX: &str = ".record-";

/// Salt length in bytes.
pub const SALT_LEN: usize = 16;

/// Default minimum password length enforced by the command layer.
pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 4;

/// Default maximum password length enforced by the command layer.
pub const DEFAULT_MAX_PASSWORD_LENGTH: usize = 64;
