//! Tool server that fetches GitHub READMEs and issues and translates them
//! with lingo.dev.

pub mod config;
pub mod error;
pub mod github;
pub mod localization;
pub mod protocol;
pub mod schema;
pub mod server;
pub mod tools;

use std::sync::Arc;

/// Build the tool registry backed by the real GitHub and lingo.dev clients
pub fn build_registry(config: &config::Config) -> anyhow::Result<tools::ToolRegistry> {
    use anyhow::Context;

    let fetcher = github::GitHubClient::from_config(config)
        .context("Failed to create GitHub client")?;
    let engine = localization::LingoEngine::from_config(config)
        .context("Failed to create lingo.dev client")?;

    let ctx = tools::ToolContext::from_config(config, Arc::new(fetcher), Arc::new(engine));
    Ok(tools::build_registry(ctx)?)
}
