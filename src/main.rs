use anyhow::Result;
use lingo_repo_agent::{build_registry, config::Config, server::Server};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored when the host supplies the environment)
    let _ = dotenvy::dotenv();

    // Initialize logging; stdout belongs to the protocol
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lingo_repo_agent=info".parse()?),
        )
        .init();

    info!("Starting lingo-repo-agent");

    // Load configuration from environment
    let config = Config::from_env()?;
    if config.github_token.is_none() {
        info!("GITHUB_TOKEN not set, using unauthenticated GitHub access");
    }

    // Clients are created once and shared by every call
    let registry = build_registry(&config)?;
    let server = Server::new(registry);

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    server.serve(stdin, tokio::io::stdout()).await?;

    info!("Server stopped");
    Ok(())
}
