use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

use crate::request::SchemaKind;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub twitch: TwitchConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub command: CommandConfig,
    #[serde(default)]
    pub ack: AckConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TwitchConfig {
    /// Channel login to join. Required.
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub oauth_token: Option<String>,
}

impl TwitchConfig {
    /// Login pair for an authenticated connection. `None` means the bot
    /// connects anonymously and can only read chat.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let username = self.username.as_deref().filter(|u| !u.is_empty())?;
        let token = self.oauth_token.as_deref().filter(|t| !t.is_empty())?;
        Some((username, token))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_api_path")]
    pub path: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub schema: SchemaKind,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            path: default_api_path(),
            api_key: None,
            schema: SchemaKind::default(),
        }
    }
}

impl ApiConfig {
    /// Full request URL: base URL without trailing slash, then the path.
    pub fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if self.path.starts_with('/') {
            format!("{}{}", base, self.path)
        } else {
            format!("{}/{}", base, self.path)
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CommandConfig {
    #[serde(default = "default_markers")]
    pub markers: Vec<String>,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            markers: default_markers(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AckConfig {
    #[serde(default = "default_ack_enabled")]
    pub enabled: bool,
    /// Reply template; `{user}` and `{item}` are substituted.
    #[serde(default = "default_ack_template")]
    pub template: String,
}

impl Default for AckConfig {
    fn default() -> Self {
        Self {
            enabled: default_ack_enabled(),
            template: default_ack_template(),
        }
    }
}

fn default_api_path() -> String {
    "/api/requests".to_string()
}

fn default_markers() -> Vec<String> {
    vec!["點:".to_string(), "點：".to_string()]
}

fn default_ack_enabled() -> bool {
    true
}

fn default_ack_template() -> String {
    "{user} 成功點了 {item}".to_string()
}

impl Config {
    /// Load `path` if it exists, apply environment overrides and validate.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Self::read_file(path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(
                "Config file {} not found, using defaults and environment",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Override file values with non-empty environment variables.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(channel) = get("CHANNEL_NAME") {
            debug!("CHANNEL_NAME set from environment");
            self.twitch.channel = channel;
        }
        if let Some(username) = get("BOT_USERNAME") {
            self.twitch.username = Some(username);
        }
        if let Some(token) = get("OAUTH_TOKEN") {
            self.twitch.oauth_token = Some(token);
        }
        if let Some(url) = get("API_URL") {
            self.api.base_url = url;
        }
        if let Some(key) = get("API_KEY") {
            self.api.api_key = Some(key);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.twitch.channel.trim().is_empty() {
            anyhow::bail!("channel missing: set CHANNEL_NAME or [twitch] channel");
        }
        if self.api.base_url.trim().is_empty() {
            anyhow::bail!("API base URL missing: set API_URL or [api] base_url");
        }
        let endpoint = self.api.endpoint();
        let url = reqwest::Url::parse(&endpoint)
            .with_context(|| format!("Invalid API endpoint: {}", endpoint))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("API endpoint must be http or https: {}", endpoint);
        }
        if self.command.markers.iter().all(|m| m.is_empty()) {
            anyhow::bail!("[command] markers must contain at least one non-empty marker");
        }
        Ok(())
    }
}
