//! Configuration for the docflow client
//!
//! Loads configuration from environment variables with sensible defaults.

use anyhow::{Context, Result};
use docflow_common::OutputFormat;
use std::env;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000/api";

/// Client configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the document backend, e.g. `http://127.0.0.1:5000/api`
    pub api_base_url: String,

    /// Seconds before an alert disappears on its own
    pub alert_dismiss_secs: u64,

    /// Output format new drafts start with
    pub default_output_format: OutputFormat,

    /// User-Agent sent with every request
    pub user_agent: String,

    /// Talk to the in-process mock backend instead of HTTP
    pub mock_mode: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            alert_dismiss_secs: 5,
            default_output_format: OutputFormat::Docx,
            user_agent: default_user_agent(),
            mock_mode: false,
        }
    }
}

fn default_user_agent() -> String {
    format!("docflow/{}", env!("CARGO_PKG_VERSION"))
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (for local development)
        dotenvy::dotenv().ok();

        let config = Config {
            api_base_url: env::var("DOCFLOW_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),

            alert_dismiss_secs: env::var("DOCFLOW_ALERT_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("Invalid DOCFLOW_ALERT_SECS")?,

            default_output_format: env::var("DOCFLOW_OUTPUT_FORMAT")
                .unwrap_or_else(|_| "docx".to_string())
                .parse()
                .context("Invalid DOCFLOW_OUTPUT_FORMAT")?,

            user_agent: env::var("DOCFLOW_USER_AGENT").unwrap_or_else(|_| default_user_agent()),

            mock_mode: env::var("DOCFLOW_MOCK")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .context("Invalid DOCFLOW_MOCK (expected true or false)")?,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.api_base_url)
            .with_context(|| format!("DOCFLOW_API_URL is not a valid URL: {}", self.api_base_url))?;

        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("DOCFLOW_API_URL must use http or https, got {}", url.scheme());
        }

        if self.alert_dismiss_secs == 0 {
            anyhow::bail!("DOCFLOW_ALERT_SECS must be greater than 0");
        }

        Ok(())
    }

    pub fn alert_dismiss(&self) -> Duration {
        Duration::from_secs(self.alert_dismiss_secs)
    }
}
