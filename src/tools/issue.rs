use super::format::{check_file_component, default_issue_filename, IssueDocument};
use super::{ToolContext, SOURCE_LOCALE, TARGET_LOCALE_DESCRIPTION};
use crate::error::{FieldError, ToolError};
use crate::protocol::ToolResponse;
use crate::schema::{FieldSpec, FieldType, InputSchema, ToolInput, ValidatedArgs};
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;

const TITLE_FIELD: &str = "title";
const BODY_FIELD: &str = "body";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueArgs {
    pub owner: String,
    pub repo: String,
    pub issue_number: u64,
    pub target_locale: String,
    pub output_path: Option<String>,
}

impl ToolInput for IssueArgs {
    fn schema() -> InputSchema {
        InputSchema::new()
            .field(FieldSpec::required("owner", FieldType::String))
            .field(FieldSpec::required("repo", FieldType::String))
            .field(FieldSpec::required("issueNumber", FieldType::PositiveInteger))
            .field(
                FieldSpec::required("targetLocale", FieldType::String)
                    .with_description(TARGET_LOCALE_DESCRIPTION),
            )
            .field(
                FieldSpec::optional("outputPath", FieldType::String).with_description(
                    "Where to write the translated issue, default \"issue-{issueNumber}-{targetLocale}.md\"",
                ),
            )
    }

    fn from_validated(args: &ValidatedArgs) -> Result<Self, FieldError> {
        let target_locale = args.require_str("targetLocale")?;
        let output_path = args.str("outputPath").map(str::to_string);

        // The locale becomes part of the default file name
        if output_path.is_none() {
            check_file_component(&target_locale)
                .map_err(|message| FieldError::new("targetLocale", message))?;
        }

        Ok(Self {
            owner: args.require_str("owner")?,
            repo: args.require_str("repo")?,
            issue_number: args.require_int("issueNumber")?,
            target_locale,
            output_path,
        })
    }
}

impl IssueArgs {
    /// Explicit path as given, otherwise the default name inside `output_dir`
    pub fn resolve_output_path(&self, ctx: &ToolContext) -> PathBuf {
        match &self.output_path {
            Some(path) => PathBuf::from(path),
            None => ctx
                .output_dir
                .join(default_issue_filename(self.issue_number, &self.target_locale)),
        }
    }
}

/// Fetch an issue, translate title and body independently, write the
/// document and return a summary.
///
/// Nothing is written unless both translations succeed.
pub async fn localize_issue(ctx: ToolContext, args: IssueArgs) -> Result<ToolResponse, ToolError> {
    info!(
        "Localizing issue {}/{}#{} to {}",
        args.owner, args.repo, args.issue_number, args.target_locale
    );

    // Step 1: Fetch
    let issue = ctx
        .bounded_fetch(
            ctx.fetcher
                .fetch_issue(&args.owner, &args.repo, args.issue_number),
        )
        .await?;

    // Step 2: Translate title and body as separate values
    let mut fields = BTreeMap::new();
    fields.insert(TITLE_FIELD.to_string(), issue.title);
    fields.insert(BODY_FIELD.to_string(), issue.body.unwrap_or_default());

    let mut translated = ctx
        .translate_step(ctx.localizer.localize_fields(
            fields,
            SOURCE_LOCALE,
            &args.target_locale,
        ))
        .await?;
    let (Some(title), Some(body)) = (translated.remove(TITLE_FIELD), translated.remove(BODY_FIELD))
    else {
        unreachable!("localize_fields keeps every key");
    };

    // Step 3: Compose
    let document = IssueDocument {
        owner: &args.owner,
        repo: &args.repo,
        number: args.issue_number,
        target_locale: &args.target_locale,
        title: &title,
        body: &body,
        translated_on: Utc::now().date_naive(),
    };

    // Step 4: Persist, replacing any previous translation
    let output_path = args.resolve_output_path(&ctx);
    std::fs::write(&output_path, document.render()).map_err(|source| ToolError::Io {
        path: output_path.clone(),
        source,
    })?;

    info!(
        "Wrote translated issue #{} to {}",
        args.issue_number,
        output_path.display()
    );

    Ok(ToolResponse::text(document.summary(&output_path)))
}
