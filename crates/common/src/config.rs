//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Telegram transport configuration.
    pub telegram: TelegramConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Health-check server configuration.
    pub server: ServerConfig,
    /// Engagement (comments/reports) configuration.
    #[serde(default)]
    pub engagement: EngagementConfig,
}

/// Telegram transport configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    /// Bot token issued by the platform.
    pub token: String,
    /// Chat id of the moderator group receiving review requests.
    pub admin_group_id: i64,
    /// Chat id of the public channel receiving published confessions.
    pub channel_id: i64,
    /// Bot API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Health-check server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Engagement configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EngagementConfig {
    /// Top-level comments per page.
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    /// Selectable report reasons, in display order.
    #[serde(default = "default_report_reasons")]
    pub report_reasons: Vec<String>,
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            report_reasons: default_report_reasons(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    5000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

const fn default_page_size() -> u64 {
    3
}

fn default_report_reasons() -> Vec<String> {
    [
        "Violence",
        "Racism",
        "Sexual Harassment",
        "Hate Speech",
        "Spam/Scam",
        "I don't like it",
    ]
    .map(String::from)
    .to_vec()
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `CONFIDE_ENV`)
    /// 3. Environment variables with `CONFIDE_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("CONFIDE_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("CONFIDE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("CONFIDE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_engagement_defaults() {
        let engagement = EngagementConfig::default();
        assert_eq!(engagement.page_size, 3);
        assert_eq!(engagement.report_reasons.len(), 6);
        assert_eq!(engagement.report_reasons[0], "Violence");
    }
}
