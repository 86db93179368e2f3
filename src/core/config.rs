//! Loading and saving `login-vault.toml`.

use crate::constants;
use crate::models::config::ConfigFile;
use crate::util::fs::{self as store_fs, Replace};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Load the config file, or defaults if it does not exist.
pub fn load(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    let mut config: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("parse config {}", path.display()))?;
    if config.store.version == 0 {
        config.store.version = 1;
    }
    Ok(config)
}

pub fn save(path: &Path, config: &ConfigFile) -> Result<()> {
    let content = toml::to_string_pretty(config).context("serialize config")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create dir {}", parent.display()))?;
    }
    store_fs::write_atomic(
        path,
        content.as_bytes(),
        constants::CONFIG_FILE_MODE,
        ".config-",
        Replace::Overwrite,
    )
    .with_context(|| format!("write config {}", path.display()))
}
