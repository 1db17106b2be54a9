use crate::config::Config;
use crate::error::{FetchError, MAX_ERROR_BODY_CHARS};
use crate::localization::preview;
use async_trait::async_trait;
use base64::Engine as _;
use chrono::DateTime;
use reqwest::{header, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// A file as returned by the contents API, still in its transport encoding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteFile {
    pub path: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
}

impl RemoteFile {
    /// Decode the content into UTF-8 text.
    ///
    /// A missing encoding is treated as base64, which is what the contents
    /// API uses for files.
    pub fn decode(&self) -> Result<String, FetchError> {
        let content = self
            .content
            .as_deref()
            .ok_or_else(|| FetchError::Decode(format!("{} has no content field", self.path)))?;

        let encoding = self.encoding.as_deref().unwrap_or("base64");
        let bytes = match encoding.to_ascii_lowercase().as_str() {
            "base64" => {
                // The API wraps base64 payloads at 60 columns
                let compact: String = content.split_whitespace().collect();
                base64::engine::general_purpose::STANDARD
                    .decode(compact.as_bytes())
                    .map_err(|e| {
                        FetchError::Decode(format!("{} is not valid base64: {}", self.path, e))
                    })?
            }
            "utf-8" | "utf8" => content.as_bytes().to_vec(),
            "none" => {
                return Err(FetchError::Decode(format!(
                    "{} is too large to be returned inline",
                    self.path
                )))
            }
            other => {
                return Err(FetchError::Decode(format!(
                    "{} uses unsupported encoding '{}'",
                    self.path, other
                )))
            }
        };

        String::from_utf8(bytes)
            .map_err(|_| FetchError::Decode(format!("{} is not valid UTF-8 text", self.path)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueRecord {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
}

/// Read access to a source-control host
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch_file(&self, owner: &str, repo: &str, path: &str)
        -> Result<RemoteFile, FetchError>;

    async fn fetch_issue(&self, owner: &str, repo: &str, number: u64)
        -> Result<IssueRecord, FetchError>;
}

/// GitHub REST API client, built once at startup and shared read-only
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

impl GitHubClient {
    pub fn new(
        api_url: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("lingo-repo-agent/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Self::new(
            &config.github_api_url,
            config.github_token.clone(),
            config.request_timeout(),
        )
    }

    async fn get(&self, url: &str, resource: &str) -> Result<Response, FetchError> {
        let mut request = self
            .http
            .get(url)
            .header(header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::TimedOut
            } else {
                FetchError::Network(e.to_string())
            }
        })?;

        log_rate_limit(&response);

        if response.status().is_success() {
            return Ok(response);
        }

        Err(classify_failure(response, resource).await)
    }
}

/// Log the rate limit headers GitHub sends with every response
fn log_rate_limit(response: &Response) {
    let headers = response.headers();
    if let Some(remaining) = headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
    {
        let limit = headers
            .get("x-ratelimit-limit")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("?");
        debug!("GitHub API rate limit: {}/{} remaining", remaining, limit);
    }
}

fn reset_time(response: &Response) -> Option<String> {
    response
        .headers()
        .get("x-ratelimit-reset")
        .and_then(|v| v.to_str().ok())
        .and_then(|ts| ts.parse::<i64>().ok())
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
        .map(|dt| dt.format("%H:%M:%S UTC").to_string())
}

async fn classify_failure(response: Response, resource: &str) -> FetchError {
    let status = response.status();
    let rate_limited = status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN
            && response
                .headers()
                .get("x-ratelimit-remaining")
                .and_then(|v| v.to_str().ok())
                == Some("0"));
    let reset_at = reset_time(&response);

    let body = response
        .text()
        .await
        .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or(body);
    let message = preview(message.trim(), MAX_ERROR_BODY_CHARS);

    match status {
        _ if rate_limited => FetchError::RateLimited { reset_at },
        StatusCode::NOT_FOUND => FetchError::NotFound {
            resource: resource.to_string(),
        },
        StatusCode::UNAUTHORIZED => FetchError::Unauthorized {
            status: status.as_u16(),
            message,
        },
        StatusCode::FORBIDDEN => FetchError::Forbidden {
            status: status.as_u16(),
            message,
        },
        _ => FetchError::Upstream {
            status: status.as_u16(),
            message,
        },
    }
}

/// Percent-encode each segment of a repository path, keeping the slashes
fn encode_path(path: &str) -> String {
    path.trim_start_matches('/')
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[async_trait]
impl SourceFetcher for GitHubClient {
    async fn fetch_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<RemoteFile, FetchError> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_url,
            urlencoding::encode(owner),
            urlencoding::encode(repo),
            encode_path(path)
        );
        let resource = format!("{} in {}/{}", path, owner, repo);
        info!("Fetching {}", resource);

        let response = self.get(&url, &resource).await?;
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        // A directory listing comes back as an array
        let value: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| FetchError::Decode(format!("invalid contents response: {}", e)))?;
        if value.is_array() {
            return Err(FetchError::Decode(format!("{} is a directory", path)));
        }

        serde_json::from_value(value)
            .map_err(|e| FetchError::Decode(format!("invalid contents response: {}", e)))
    }

    async fn fetch_issue(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<IssueRecord, FetchError> {
        let url = format!(
            "{}/repos/{}/{}/issues/{}",
            self.api_url,
            urlencoding::encode(owner),
            urlencoding::encode(repo),
            number
        );
        let resource = format!("issue {}/{}#{}", owner, repo, number);
        info!("Fetching {}", resource);

        let response = self.get(&url, &resource).await?;
        response
            .json::<IssueRecord>()
            .await
            .map_err(|e| FetchError::Decode(format!("invalid issue response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn client_for(server: &MockServer, token: Option<&str>) -> GitHubClient {
        GitHubClient::new(
            &server.uri(),
            token.map(str::to_string),
            Duration::from_secs(5),
        )
        .expect("client should build")
    }

    fn encode(text: &str) -> String {
        base64::engine::general_purpose::STANDARD.encode(text)
    }

    // ==================== RemoteFile Decoding Tests ====================

    #[test]
    fn test_decode_base64_with_line_breaks() {
        let encoded = encode("# Hello World\n\nThis is a README with enough text to wrap.");
        let wrapped = encoded
            .as_bytes()
            .chunks(20)
            .map(|c| std::str::from_utf8(c).unwrap())
            .collect::<Vec<_>>()
            .join("\n");

        let file = RemoteFile {
            path: "README.md".to_string(),
            content: Some(wrapped),
            encoding: Some("base64".to_string()),
        };

        assert_eq!(
            file.decode().unwrap(),
            "# Hello World\n\nThis is a README with enough text to wrap."
        );
    }

    #[test]
    fn test_decode_defaults_to_base64() {
        let file = RemoteFile {
            path: "README.md".to_string(),
            content: Some(encode("héllo")),
            encoding: None,
        };
        assert_eq!(file.decode().unwrap(), "héllo");
    }

    #[test]
    fn test_decode_utf8_passthrough() {
        let file = RemoteFile {
            path: "README.md".to_string(),
            content: Some("plain text".to_string()),
            encoding: Some("utf-8".to_string()),
        };
        assert_eq!(file.decode().unwrap(), "plain text");
    }

    #[test]
    fn test_decode_failures() {
        let invalid = RemoteFile {
            path: "README.md".to_string(),
            content: Some("@@not base64@@".to_string()),
            encoding: Some("base64".to_string()),
        };
        assert!(matches!(invalid.decode(), Err(FetchError::Decode(_))));

        let binary = RemoteFile {
            path: "logo.png".to_string(),
            content: Some(base64::engine::general_purpose::STANDARD.encode([0xff, 0xfe, 0x00])),
            encoding: Some("base64".to_string()),
        };
        let err = binary.decode().unwrap_err();
        assert!(err.to_string().contains("UTF-8"));

        let too_large = RemoteFile {
            path: "BIG.md".to_string(),
            content: Some(String::new()),
            encoding: Some("none".to_string()),
        };
        assert!(too_large.decode().unwrap_err().to_string().contains("too large"));

        let missing = RemoteFile {
            path: "README.md".to_string(),
            content: None,
            encoding: None,
        };
        assert!(missing.decode().unwrap_err().to_string().contains("no content"));
    }

    #[test]
    fn test_encode_path_keeps_slashes() {
        assert_eq!(encode_path("docs/README.md"), "docs/README.md");
        assert_eq!(encode_path("/docs/my file.md"), "docs/my%20file.md");
    }

    // ==================== HTTP Tests ====================

    #[tokio::test]
    async fn test_fetch_file_success_with_token() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/octo/hello-world/contents/README.md"))
            .and(header("Authorization", "Bearer ghp_test"))
            .and(header("Accept", "application/vnd.github+json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "type": "file",
                "path": "README.md",
                "encoding": "base64",
                "content": encode("# Hello"),
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Some("ghp_test"));
        let file = client
            .fetch_file("octo", "hello-world", "README.md")
            .await
            .expect("fetch should succeed");

        assert_eq!(file.path, "README.md");
        assert_eq!(file.decode().unwrap(), "# Hello");
    }

    #[tokio::test]
    async fn test_fetch_file_nested_path() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/octo/hello-world/contents/docs/README.es.md"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "path": "docs/README.es.md",
                "encoding": "base64",
                "content": encode("hola"),
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let file = client
            .fetch_file("octo", "hello-world", "docs/README.es.md")
            .await
            .expect("fetch should succeed");
        assert_eq!(file.decode().unwrap(), "hola");
    }

    #[tokio::test]
    async fn test_fetch_file_directory_is_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/octo/hello-world/contents/docs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "path": "docs/a.md", "type": "file" }
            ])))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let err = client
            .fetch_file("octo", "hello-world", "docs")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("directory"));
    }

    #[tokio::test]
    async fn test_fetch_issue_success_with_null_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/octo/hello-world/issues/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "number": 42,
                "title": "Bug: crash on start",
                "body": null,
                "html_url": "https://github.com/octo/hello-world/issues/42",
                "state": "open",
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let issue = client
            .fetch_issue("octo", "hello-world", 42)
            .await
            .expect("fetch should succeed");

        assert_eq!(issue.number, 42);
        assert_eq!(issue.title, "Bug: crash on start");
        assert!(issue.body.is_none());
    }

    #[tokio::test]
    async fn test_fetch_issue_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/octo/hello-world/issues/999999"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(serde_json::json!({ "message": "Not Found" })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let err = client
            .fetch_issue("octo", "hello-world", 999999)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::NotFound { .. }));
        assert!(!err.is_transient());
        assert!(err.to_string().contains("octo/hello-world#999999"));
    }

    #[tokio::test]
    async fn test_rate_limited_is_transient() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/octo/hello-world/issues/1"))
            .respond_with(
                ResponseTemplate::new(403)
                    .insert_header("x-ratelimit-remaining", "0")
                    .insert_header("x-ratelimit-limit", "60")
                    .insert_header("x-ratelimit-reset", "1705312200")
                    .set_body_json(serde_json::json!({ "message": "API rate limit exceeded" })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let err = client.fetch_issue("octo", "hello-world", 1).await.unwrap_err();

        match &err {
            FetchError::RateLimited { reset_at } => {
                assert_eq!(reset_at.as_deref(), Some("09:50:00 UTC"));
            }
            other => panic!("expected rate limit, got {:?}", other),
        }
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_forbidden_and_unauthorized() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/octo/private/issues/1"))
            .respond_with(
                ResponseTemplate::new(403)
                    .insert_header("x-ratelimit-remaining", "42")
                    .set_body_json(serde_json::json!({ "message": "Resource not accessible" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/private/issues/2"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({ "message": "Bad credentials" })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, Some("expired"));

        let forbidden = client.fetch_issue("octo", "private", 1).await.unwrap_err();
        assert!(matches!(forbidden, FetchError::Forbidden { status: 403, .. }));
        assert!(forbidden.to_string().contains("Resource not accessible"));

        let unauthorized = client.fetch_issue("octo", "private", 2).await.unwrap_err();
        assert!(matches!(unauthorized, FetchError::Unauthorized { status: 401, .. }));
        assert!(unauthorized.to_string().contains("Bad credentials"));
    }

    #[tokio::test]
    async fn test_server_error_is_transient() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/octo/hello-world/issues/7"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let err = client.fetch_issue("octo", "hello-world", 7).await.unwrap_err();

        assert!(matches!(err, FetchError::Upstream { status: 502, .. }));
        assert!(err.is_transient());
        assert!(err.to_string().contains("bad gateway"));
    }

    #[tokio::test]
    async fn test_error_body_is_truncated() {
        let server = MockServer::start().await;
        let long_body = "e".repeat(2000);

        Mock::given(method("GET"))
            .and(path("/repos/octo/hello-world/issues/9"))
            .respond_with(ResponseTemplate::new(500).set_body_string(long_body.clone()))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let err = client.fetch_issue("octo", "hello-world", 9).await.unwrap_err();

        match &err {
            FetchError::Upstream { status, message } => {
                assert_eq!(*status, 500);
                assert_eq!(message.chars().count(), MAX_ERROR_BODY_CHARS + 1);
                assert!(message.ends_with('…'));
            }
            other => panic!("expected upstream error, got {:?}", other),
        }
        assert!(!err.to_string().contains(&long_body));
    }

    #[tokio::test]
    async fn test_malformed_issue_response() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/octo/hello-world/issues/8"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let err = client.fetch_issue("octo", "hello-world", 8).await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[tokio::test]
    async fn test_fetch_without_token() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/octo/hello-world/issues/9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "number": 9,
                "title": "Anonymous",
                "body": "works",
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let issue = client
            .fetch_issue("octo", "hello-world", 9)
            .await
            .expect("fetch should succeed");
        assert_eq!(issue.body.as_deref(), Some("works"));
    }
}
