//! CLI routing and command dispatch.

use crate::core::config;
use crate::core::credstore::CredentialStore;
use crate::core::paths::StorePaths;
use crate::models::config::ConfigFile;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod account;
pub mod audit;
pub mod init;

/// Shared context passed to all command handlers.
pub struct CliContext {
    pub paths: StorePaths,
    pub non_interactive: bool,
    pub config: ConfigFile,
}

impl CliContext {
    pub fn open_store(&self) -> Result<CredentialStore> {
        let store = CredentialStore::open(self.paths.clone())
            .with_context(|| format!("open credential store {}", self.paths.root.display()))?;
        Ok(store.with_audit(self.config.policy.audit))
    }
}

#[derive(Parser, Debug)]
#[command(name = "login-vault", version, about = "Password credential store for login accounts")]
pub struct Cli {
    /// Store root directory
    #[arg(long, global = true, value_name = "PATH")]
    pub root: Option<PathBuf>,

    /// Run in non-interactive mode (no prompts; passwords come from stdin)
    #[arg(long, global = true, env = "LOGIN_VAULT_NON_INTERACTIVE")]
    pub non_interactive: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn", value_name = "FILTER")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let paths = StorePaths::resolve(self.root);

        // Best-effort: a broken config must not lock users out of `login`.
        let config = match config::load(&paths.config_toml) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %format!("{:#}", e), "using default configuration");
                ConfigFile::default()
            }
        };

        let ctx = CliContext {
            paths,
            non_interactive: self.non_interactive,
            config,
        };

        match self.command {
            Commands::Init(args) => init::run(&ctx, args),
            Commands::Register(args) => account::run_register(&ctx, args),
            Commands::Login(args) => account::run_login(&ctx, args),
            Commands::ChangePassword(args) => account::run_change_password(&ctx, args),
            Commands::Delete(args) => account::run_delete(&ctx, args),
            Commands::Status(args) => account::run_status(&ctx, args),
            Commands::Audit { command } => audit::run(&ctx, command),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the store directories and a default config file
    Init(init::InitArgs),
    /// Register a password for an identity
    Register(account::RegisterArgs),
    /// Check a password for an identity
    Login(account::PasswordArgs),
    /// Change the password of a registered identity
    ChangePassword(account::PasswordArgs),
    /// Delete a registered identity's credentials
    Delete(account::PasswordArgs),
    /// Show whether an identity is registered
    Status(account::StatusArgs),
    /// View or verify the audit trail
    Audit {
        #[command(subcommand)]
        command: audit::AuditCommand,
    },
}
