use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::*;

use crate::api::Transport;
use crate::config::Config;

#[derive(Args)]
pub struct ConfigCommands {
    #[command(subcommand)]
    pub command: ConfigSubcommands,
}

#[derive(Subcommand)]
pub enum ConfigSubcommands {
    /// Show the config file location and current values
    Show,
    /// Update configuration values
    Set {
        /// Default transport (rest or graph)
        #[arg(long)]
        transport: Option<Transport>,
        /// SharePoint site URL used by the REST transport
        #[arg(long)]
        site: Option<String>,
        /// Microsoft Graph host
        #[arg(long)]
        graph_url: Option<String>,
        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
}

pub fn config_command(args: ConfigCommands, mut config: Config) -> Result<()> {
    match args.command {
        ConfigSubcommands::Show => {
            let path = Config::get_config_path()?;
            println!("{} {}", "Config file:".bold(), path.display().to_string().cyan());
            println!();
            let content =
                toml::to_string_pretty(&config).context("Failed to serialize config to TOML")?;
            print!("{}", content);
            Ok(())
        }
        ConfigSubcommands::Set {
            transport,
            site,
            graph_url,
            timeout,
        } => {
            if let Some(transport) = transport {
                config.transport = transport;
            }
            if let Some(site) = site {
                config.site_url = Some(site.trim_end_matches('/').to_string());
            }
            if let Some(graph_url) = graph_url {
                config.graph_url = graph_url.trim_end_matches('/').to_string();
            }
            if let Some(timeout) = timeout {
                config.settings.timeout_secs = timeout;
            }
            config.save()?;
            println!("{} Configuration updated", "✓".bright_green().bold());
            Ok(())
        }
    }
}
