use crate::cli::CliContext;
use crate::constants;
use crate::core::config;
use crate::util::fs as store_fs;
use anyhow::{Context, Result};
use clap::Args;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Rewrite the config file with defaults even if it exists
    #[arg(long)]
    pub reset_config: bool,
}

pub fn run(ctx: &CliContext, args: InitArgs) -> Result<()> {
    let paths = &ctx.paths;
    store_fs::ensure_dir(&paths.records, constants::RECORDS_DIR_MODE)
        .with_context(|| format!("create {}", paths.records.display()))?;

    if args.reset_config || !paths.config_toml.exists() {
        let config = if args.reset_config {
            Default::default()
        } else {
            ctx.config.clone()
        };
        config::save(&paths.config_toml, &config)?;
        println!("Wrote {}", paths.config_toml.display());
    }

    println!("store initialized at {}", paths.root.display());
    Ok(())
}
