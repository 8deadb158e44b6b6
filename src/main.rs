use anyhow::Result;
use clap::Parser;
use colored::*;
use log::{debug, LevelFilter};

use m365_query::cli::commands::{compose_command, config_command, run_command};
use m365_query::cli::{Cli, Commands};
use m365_query::config::Config;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{} {:#}", "error:".bright_red().bold(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // A missing .env file is fine; the token may come from the environment
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if cli.verbose {
        logger.filter_level(LevelFilter::Debug);
    }
    logger.init();

    let config = Config::load()?;
    debug!("Using {} transport by default", config.transport);

    match cli.command {
        Commands::Compose(args) => compose_command(args, &config),
        Commands::Run(args) => run_command(args, &config).await,
        Commands::Config(args) => config_command(args, config),
    }
}
