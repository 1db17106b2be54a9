//! Localization adapter over the lingo.dev engine.
//!
//! The adapter accepts either a single text or a map of named texts. Map
//! values are translated one at a time so that unrelated fields (an issue
//! title and its body) never influence each other's translation.

use crate::config::Config;
use crate::error::{EngineError, TranslationError, MAX_ERROR_BODY_CHARS};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Maximum characters of a failed input echoed back in errors
pub const PREVIEW_CHARS: usize = 80;

/// A text translation backend
#[async_trait]
pub trait TranslationEngine: Send + Sync {
    async fn translate(
        &self,
        text: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> Result<String, EngineError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalizeInput {
    Text(String),
    Fields(BTreeMap<String, String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalizedResult {
    Text(String),
    Fields(BTreeMap<String, String>),
}

/// Shape-preserving front end to a [`TranslationEngine`]
#[derive(Clone)]
pub struct Localizer {
    engine: Arc<dyn TranslationEngine>,
    call_timeout: Option<Duration>,
}

impl Localizer {
    pub fn new(engine: Arc<dyn TranslationEngine>) -> Self {
        Self {
            engine,
            call_timeout: None,
        }
    }

    /// Bound every engine call separately
    pub fn with_call_timeout(mut self, limit: Duration) -> Self {
        self.call_timeout = Some(limit);
        self
    }

    pub async fn localize(
        &self,
        input: LocalizeInput,
        source_locale: &str,
        target_locale: &str,
    ) -> Result<LocalizedResult, TranslationError> {
        match input {
            LocalizeInput::Text(text) => self
                .localize_text(&text, source_locale, target_locale)
                .await
                .map(LocalizedResult::Text),
            LocalizeInput::Fields(fields) => self
                .localize_fields(fields, source_locale, target_locale)
                .await
                .map(LocalizedResult::Fields),
        }
    }

    /// Translate each value on its own, in key order. Keys are preserved.
    pub async fn localize_fields(
        &self,
        fields: BTreeMap<String, String>,
        source_locale: &str,
        target_locale: &str,
    ) -> Result<BTreeMap<String, String>, TranslationError> {
        let mut translated = BTreeMap::new();
        for (name, value) in fields {
            let result = self
                .localize_text(&value, source_locale, target_locale)
                .await?;
            translated.insert(name, result);
        }
        Ok(translated)
    }

    /// Translate one text. Empty input never reaches the engine.
    pub async fn localize_text(
        &self,
        text: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> Result<String, TranslationError> {
        if text.is_empty() {
            return Ok(String::new());
        }

        debug!(
            "Localizing {} chars {} -> {}",
            text.chars().count(),
            source_locale,
            target_locale
        );

        let call = self.engine.translate(text, source_locale, target_locale);
        let outcome = match self.call_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or(Err(EngineError::TimedOut)),
            None => call.await,
        };

        outcome.map_err(|cause| {
            warn!("Localization {} -> {} failed: {}", source_locale, target_locale, cause);
            TranslationError {
                source_locale: source_locale.to_string(),
                target_locale: target_locale.to_string(),
                preview: preview(text, PREVIEW_CHARS),
                cause,
            }
        })
    }
}

/// First `max_chars` characters of `text`, with an ellipsis when cut
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.char_indices();
    match chars.nth(max_chars) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}

// ==================== lingo.dev engine ====================

#[derive(Debug, Serialize)]
struct LocalizeRequest<'a> {
    params: RequestParams,
    locale: LocalePair<'a>,
    data: TextPayload<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestParams {
    workflow_id: String,
    fast: bool,
}

#[derive(Debug, Serialize)]
struct LocalePair<'a> {
    source: &'a str,
    target: &'a str,
}

#[derive(Debug, Serialize)]
struct TextPayload<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct LocalizeResponse {
    data: Option<ResponseData>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseData {
    text: Option<String>,
}

/// lingo.dev localization engine client
pub struct LingoEngine {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl LingoEngine {
    pub fn new(api_url: &str, api_key: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Self::new(
            &config.lingo_api_url,
            &config.lingo_api_key,
            config.request_timeout(),
        )
    }
}

#[async_trait]
impl TranslationEngine for LingoEngine {
    async fn translate(
        &self,
        text: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> Result<String, EngineError> {
        let request = LocalizeRequest {
            params: RequestParams {
                workflow_id: uuid::Uuid::new_v4().to_string(),
                fast: false,
            },
            locale: LocalePair {
                source: source_locale,
                target: target_locale,
            },
            data: TextPayload { text },
        };

        let response = self
            .http
            .post(format!("{}/i18n", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EngineError::TimedOut
                } else {
                    EngineError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            let message = preview(body.trim(), MAX_ERROR_BODY_CHARS);
            return Err(if status.is_server_error() {
                EngineError::Server {
                    status: status.as_u16(),
                    message,
                }
            } else if status == reqwest::StatusCode::BAD_REQUEST {
                EngineError::InvalidRequest {
                    status: status.as_u16(),
                    message,
                }
            } else {
                EngineError::Rejected(format!("({}) {}", status, message))
            });
        }

        let parsed: LocalizeResponse = response
            .json()
            .await
            .map_err(|e| EngineError::MalformedResponse(e.to_string()))?;

        match (parsed.data, parsed.error) {
            (Some(data), _) => data.text.ok_or_else(|| {
                EngineError::MalformedResponse("response data has no text field".to_string())
            }),
            (None, Some(error)) => Err(EngineError::Rejected(error)),
            (None, None) => Err(EngineError::MalformedResponse(
                "response has neither data nor error".to_string(),
            )),
        }
    }
}
