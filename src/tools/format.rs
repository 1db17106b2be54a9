//! Shaping translated content into documents and summaries.

use chrono::NaiveDate;
use std::path::Path;

/// Web URL of an issue
pub fn issue_url(owner: &str, repo: &str, number: u64) -> String {
    format!("https://github.com/{}/{}/issues/{}", owner, repo, number)
}

/// Default file name for a translated issue
pub fn default_issue_filename(number: u64, target_locale: &str) -> String {
    format!("issue-{}-{}.md", number, target_locale)
}

/// Reject values that would leave the directory when used in a file name
pub fn check_file_component(value: &str) -> Result<(), String> {
    if value.contains(['/', '\\']) {
        return Err(format!("'{}' must not contain path separators", value));
    }
    if value == "." || value == ".." {
        return Err(format!("'{}' is not a valid file name part", value));
    }
    Ok(())
}

/// Translated issue content and where it came from
#[derive(Debug, Clone)]
pub struct IssueDocument<'a> {
    pub owner: &'a str,
    pub repo: &'a str,
    pub number: u64,
    pub target_locale: &'a str,
    pub title: &'a str,
    pub body: &'a str,
    pub translated_on: NaiveDate,
}

impl IssueDocument<'_> {
    /// Render the markdown file written to disk
    pub fn render(&self) -> String {
        format!(
            "# Translated Issue #{number}: {owner}/{repo}\n\n\
             **Title:** {title}\n\n\
             ---\n\n\
             {body}\n\n\
             ---\n\n\
             *Original issue: {url}*\n\
             *Translated to {locale} on {date}*\n",
            number = self.number,
            owner = self.owner,
            repo = self.repo,
            title = self.title,
            body = self.body,
            url = issue_url(self.owner, self.repo, self.number),
            locale = self.target_locale,
            date = self.translated_on.format("%Y-%m-%d"),
        )
    }

    /// Text returned to the caller once the file is written
    pub fn summary(&self, output_path: &Path) -> String {
        format!(
            "Successfully translated issue #{number} to {locale} and saved it to {path}\n\n\
             **Title:** {title}\n\n\
             ---\n\n\
             {body}",
            number = self.number,
            locale = self.target_locale,
            path = output_path.display(),
            title = self.title,
            body = self.body,
        )
    }
}
