use super::{ToolContext, SOURCE_LOCALE, TARGET_LOCALE_DESCRIPTION};
use crate::error::{FieldError, ToolError};
use crate::protocol::ToolResponse;
use crate::schema::{FieldSpec, FieldType, InputSchema, ToolInput, ValidatedArgs};
use tracing::info;

pub const DEFAULT_README_PATH: &str = "README.md";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadmeArgs {
    pub owner: String,
    pub repo: String,
    pub target_locale: String,
    pub readme_path: String,
}

impl ToolInput for ReadmeArgs {
    fn schema() -> InputSchema {
        InputSchema::new()
            .field(FieldSpec::required("owner", FieldType::String))
            .field(FieldSpec::required("repo", FieldType::String))
            .field(
                FieldSpec::required("targetLocale", FieldType::String)
                    .with_description(TARGET_LOCALE_DESCRIPTION),
            )
            .field(
                FieldSpec::optional("readmePath", FieldType::String)
                    .with_description("Path to README file, default \"README.md\"")
                    .with_default(DEFAULT_README_PATH),
            )
    }

    fn from_validated(args: &ValidatedArgs) -> Result<Self, FieldError> {
        Ok(Self {
            owner: args.require_str("owner")?,
            repo: args.require_str("repo")?,
            target_locale: args.require_str("targetLocale")?,
            readme_path: args
                .str("readmePath")
                .unwrap_or(DEFAULT_README_PATH)
                .to_string(),
        })
    }
}

/// Fetch a README, decode it and return its translation verbatim
pub async fn localize_readme(ctx: ToolContext, args: ReadmeArgs) -> Result<ToolResponse, ToolError> {
    info!(
        "Localizing {} of {}/{} to {}",
        args.readme_path, args.owner, args.repo, args.target_locale
    );

    // Step 1: Fetch and decode
    let file = ctx
        .bounded_fetch(ctx.fetcher.fetch_file(&args.owner, &args.repo, &args.readme_path))
        .await?;
    let text = file.decode()?;

    // Step 2: Translate
    let translated = ctx
        .translate_step(ctx.localizer.localize_text(
            &text,
            SOURCE_LOCALE,
            &args.target_locale,
        ))
        .await?;

    info!(
        "Translated {} ({} chars -> {} chars)",
        args.readme_path,
        text.chars().count(),
        translated.chars().count()
    );

    // Step 3: Respond
    Ok(ToolResponse::text(translated))
}
