use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_LINGO_API_URL: &str = "https://engine.lingo.dev";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    // lingo.dev
    pub lingo_api_key: String,
    pub lingo_api_url: String,

    // GitHub
    pub github_token: Option<String>,
    pub github_api_url: String,

    // Limits
    pub request_timeout_secs: u64,

    // Output
    pub output_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            // lingo.dev
            lingo_api_key: std::env::var("LINGODOTDEV_API_KEY")
                .ok()
                .filter(|v| !v.is_empty())
                .context("LINGODOTDEV_API_KEY not set")?,
            lingo_api_url: optional_var("LINGODOTDEV_API_URL")
                .unwrap_or_else(|| DEFAULT_LINGO_API_URL.to_string()),

            // GitHub - token is optional, public repos work unauthenticated
            github_token: optional_var("GITHUB_TOKEN"),
            github_api_url: optional_var("GITHUB_API_URL")
                .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string()),

            // Limits
            request_timeout_secs: optional_var("REQUEST_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),

            // Output
            output_dir: optional_var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
        })
    }

    /// Bound applied to every external call
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Read an environment variable, treating empty values as unset
fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
