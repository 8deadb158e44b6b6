use crate::api::constants::{ACCESS_TOKEN_ENV, GRAPH_BASE_URL};
use crate::api::expression::Transport;
use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub transport: Transport,
    /// Site collection URL, e.g. `https://contoso.sharepoint.com/sites/dev`
    #[serde(default)]
    pub site_url: Option<String>,
    #[serde(default = "default_graph_url")]
    pub graph_url: String,
    #[serde(default)]
    pub settings: Settings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_graph_url() -> String {
    GRAPH_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            transport: Transport::default(),
            site_url: None,
            graph_url: default_graph_url(),
            settings: Settings::default(),
        }
    }
}

impl Config {
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("m365-query");

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {:?}", config_dir))?;
            info!("Created config directory: {:?}", config_dir);
        }

        Ok(config_dir.join("config.toml"))
    }

    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        debug!("Loading config from: {:?}", config_path);

        if !config_path.exists() {
            info!("Config file doesn't exist, using defaults");
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        Self::from_toml(&config_content)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        debug!("Saving config to: {:?}", config_path);

        let config_content =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, config_content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        info!("Config saved successfully");
        Ok(())
    }

    /// Host the given transport talks to
    pub fn base_url(&self, transport: Transport) -> Result<String> {
        match transport {
            Transport::Rest => self
                .site_url
                .clone()
                .context("No SharePoint site configured. Run 'm365-query config set --site <url>'"),
            Transport::Graph => Ok(self.graph_url.clone()),
        }
    }

    /// Bearer token from the environment (a `.env` file is loaded at startup)
    pub fn access_token() -> Result<String> {
        std::env::var(ACCESS_TOKEN_ENV).with_context(|| format!("{} is not set", ACCESS_TOKEN_ENV))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_for_empty_file() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.transport, Transport::Rest);
        assert_eq!(config.settings.timeout_secs, 30);
        assert!(config.base_url(Transport::Rest).is_err());
        assert_eq!(config.base_url(Transport::Graph).unwrap(), "https://graph.microsoft.com");
    }

    #[test]
    fn test_parse_partial_file() {
        let config = Config::from_toml(
            r#"
transport = "graph"
site_url = "https://contoso.sharepoint.com/sites/dev"

[settings]
timeout_secs = 90
"#,
        )
        .unwrap();

        assert_eq!(config.transport, Transport::Graph);
        assert_eq!(config.settings.timeout_secs, 90);
        assert_eq!(config.settings.connect_timeout_secs, 10);
        assert_eq!(
            config.base_url(Transport::Rest).unwrap(),
            "https://contoso.sharepoint.com/sites/dev"
        );
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = Config {
            site_url: Some("https://contoso.sharepoint.com".to_string()),
            ..Config::default()
        };
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(Config::from_toml(&text).unwrap(), config);
    }
}
