//! The two localization tools and the registry that serves them.
//!
//! Each tool runs fetch, translate, format (and for issues, write) strictly
//! in sequence. Every external call is bounded by the configured timeout on
//! its own.

pub mod format;
pub mod issue;
pub mod readme;
pub mod registry;

pub use issue::IssueArgs;
pub use readme::ReadmeArgs;
pub use registry::{RegistryError, ToolRegistry};

use crate::config::Config;
use crate::error::{EngineError, FetchError, Stage, ToolError, TranslationError};
use crate::github::SourceFetcher;
use crate::localization::{Localizer, TranslationEngine};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub const README_TOOL: &str = "localize_github_readme";
pub const ISSUE_TOOL: &str = "localize_github_issue";

/// Content is always authored in English
pub const SOURCE_LOCALE: &str = "en";

pub const TARGET_LOCALE_DESCRIPTION: &str = "ISO code like 'es-ES', 'zh-CN', or 'fr-FR'";

/// Shared, read-only collaborators handed to every tool invocation
#[derive(Clone)]
pub struct ToolContext {
    pub fetcher: Arc<dyn SourceFetcher>,
    pub localizer: Localizer,
    pub call_timeout: Duration,
    pub output_dir: PathBuf,
}

impl ToolContext {
    pub fn new(
        fetcher: Arc<dyn SourceFetcher>,
        engine: Arc<dyn TranslationEngine>,
        call_timeout: Duration,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            fetcher,
            localizer: Localizer::new(engine).with_call_timeout(call_timeout),
            call_timeout,
            output_dir,
        }
    }

    pub fn from_config(
        config: &Config,
        fetcher: Arc<dyn SourceFetcher>,
        engine: Arc<dyn TranslationEngine>,
    ) -> Self {
        Self::new(
            fetcher,
            engine,
            config.request_timeout(),
            config.output_dir.clone(),
        )
    }

    /// Run a fetch step under the call timeout
    pub(crate) async fn bounded_fetch<T, F>(&self, fut: F) -> Result<T, ToolError>
    where
        F: Future<Output = Result<T, FetchError>>,
    {
        match tokio::time::timeout(self.call_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(FetchError::TimedOut)) | Err(_) => Err(ToolError::Timeout {
                stage: Stage::Fetch,
                after: self.call_timeout,
            }),
            Ok(Err(e)) => Err(ToolError::Fetch(e)),
        }
    }

    /// Await a translate step. The localizer bounds each engine call on its own.
    pub(crate) async fn translate_step<T, F>(&self, fut: F) -> Result<T, ToolError>
    where
        F: Future<Output = Result<T, TranslationError>>,
    {
        fut.await.map_err(|e| {
            if matches!(e.cause, EngineError::TimedOut) {
                ToolError::Timeout {
                    stage: Stage::Translate,
                    after: self.call_timeout,
                }
            } else {
                ToolError::Translation(e)
            }
        })
    }
}

/// Build the registry with both localization tools
pub fn build_registry(ctx: ToolContext) -> Result<ToolRegistry, RegistryError> {
    let mut registry = ToolRegistry::new();

    let readme_ctx = ctx.clone();
    registry.register(
        README_TOOL,
        "Fetches a GitHub repository README and uses lingo.dev to translate it for non-English contributors.",
        move |args: ReadmeArgs| readme::localize_readme(readme_ctx.clone(), args),
    )?;

    registry.register(
        ISSUE_TOOL,
        "Fetches a GitHub issue and uses lingo.dev to translate it for non-English contributors.",
        move |args: IssueArgs| issue::localize_issue(ctx.clone(), args),
    )?;

    Ok(registry)
}
