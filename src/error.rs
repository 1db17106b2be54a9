//! Error taxonomy for tool invocations.
//!
//! Every failure names the stage it came from so callers can tell a bad
//! request apart from a downstream failure without inspecting internals.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Maximum characters of an upstream error body kept in messages
pub const MAX_ERROR_BODY_CHARS: usize = 300;

/// Pipeline stage an error originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validation,
    Fetch,
    Translate,
    Write,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Validation => "validation",
            Stage::Fetch => "fetch",
            Stage::Translate => "translate",
            Stage::Write => "write",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single argument that failed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// GitHub retrieval failures
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{resource} not found")]
    NotFound { resource: String },

    #[error("GitHub rejected the credentials ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    #[error("GitHub denied access ({status}): {message}")]
    Forbidden { status: u16, message: String },

    #[error("GitHub rate limit exceeded{}", reset_suffix(.reset_at))]
    RateLimited { reset_at: Option<String> },

    #[error("GitHub API error ({status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("request to GitHub failed: {0}")]
    Network(String),

    #[error("request to GitHub timed out")]
    TimedOut,

    #[error("could not decode GitHub response: {0}")]
    Decode(String),
}

fn reset_suffix(reset_at: &Option<String>) -> String {
    match reset_at {
        Some(reset) => format!(" (resets at {})", reset),
        None => String::new(),
    }
}

impl FetchError {
    /// Whether the same request could succeed later
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::RateLimited { .. } | FetchError::Network(_) | FetchError::TimedOut => true,
            FetchError::Upstream { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Failures reported by the translation engine itself
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("server error ({status}), the service may be temporarily unavailable: {message}")]
    Server { status: u16, message: String },

    #[error("invalid request ({status}): {message}")]
    InvalidRequest { status: u16, message: String },

    #[error("engine returned an error: {0}")]
    Rejected(String),

    #[error("request to engine failed: {0}")]
    Network(String),

    #[error("malformed engine response: {0}")]
    MalformedResponse(String),

    #[error("engine call timed out")]
    TimedOut,
}

/// A failed localization, carrying enough context to diagnose it without the
/// full payload
#[derive(Debug, Error)]
#[error("translation {source_locale} -> {target_locale} failed for \"{preview}\": {cause}")]
pub struct TranslationError {
    pub source_locale: String,
    pub target_locale: String,
    pub preview: String,
    #[source]
    pub cause: EngineError,
}

/// Anything that can go wrong while serving a tool call
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid arguments: {}", join_field_errors(.0))]
    Validation(Vec<FieldError>),

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{stage} timed out after {}s", .after.as_secs())]
    Timeout { stage: Stage, after: Duration },
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl ToolError {
    pub fn stage(&self) -> Stage {
        match self {
            ToolError::Validation(_) | ToolError::UnknownTool(_) => Stage::Validation,
            ToolError::Fetch(_) => Stage::Fetch,
            ToolError::Translation(_) => Stage::Translate,
            ToolError::Io { .. } => Stage::Write,
            ToolError::Timeout { stage, .. } => *stage,
        }
    }

    /// Stable machine-readable name of the error class
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::Validation(_) | ToolError::UnknownTool(_) => "validation_error",
            ToolError::Fetch(_) => "fetch_error",
            ToolError::Translation(_) => "translation_error",
            ToolError::Io { .. } => "io_error",
            ToolError::Timeout { .. } => "timeout_error",
        }
    }

    /// True when the caller sent a bad request rather than the operation failing downstream
    pub fn is_invalid_request(&self) -> bool {
        self.stage() == Stage::Validation
    }

    pub fn is_transient(&self) -> bool {
        match self {
            ToolError::Fetch(e) => e.is_transient(),
            ToolError::Translation(e) => matches!(
                e.cause,
                EngineError::Server { .. } | EngineError::Network(_) | EngineError::TimedOut
            ),
            ToolError::Timeout { .. } => true,
            _ => false,
        }
    }
}
