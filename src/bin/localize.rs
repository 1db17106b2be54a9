//! One-shot tool runner - invokes a single tool and prints its text output
//!
//! Usage:
//!   cargo run --bin localize -- localize_github_readme '{"owner":"octo","repo":"hello-world","targetLocale":"es-ES"}'
//!   cargo run --bin localize -- localize_github_issue '{"owner":"octo","repo":"hello-world","issueNumber":42,"targetLocale":"es-ES"}'
//!   cargo run --bin localize -- --list
//!
//! Required environment variables:
//! - LINGODOTDEV_API_KEY
//!
//! Optional:
//! - GITHUB_TOKEN (unauthenticated when unset)
//! - OUTPUT_DIR (defaults to the current directory)

use anyhow::{bail, Context, Result};
use lingo_repo_agent::{build_registry, config::Config};
use serde_json::Value;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lingo_repo_agent=info".parse()?)
                .add_directive("localize=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    let config = Config::from_env()?;
    let registry = build_registry(&config)?;

    if args.first().map(String::as_str) == Some("--list") {
        for tool in registry.list() {
            println!("{}\n  {}\n", tool.name, tool.description);
        }
        return Ok(());
    }

    let (tool, raw_args) = match args.as_slice() {
        [tool, raw_args] => (tool, raw_args),
        _ => bail!("usage: localize <tool-name> '<json-arguments>' | localize --list"),
    };

    let arguments: Value =
        serde_json::from_str(raw_args).context("Tool arguments must be a JSON object")?;

    info!("Invoking {}", tool);
    let response = registry.call(tool, &arguments).await?;

    for block in &response.content {
        println!("{}", block.as_text());
    }

    Ok(())
}
