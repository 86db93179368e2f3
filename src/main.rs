use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = login_vault::cli::Cli::parse();
    login_vault::util::logging::init(&cli.log_level);
    cli.run()
}
