//! HTTP client for the remote chat service.
//!
//! The service speaks a single JSON request/response pair:
//! - `POST {base}` with `{ "message", "conversationId" }` returns `{ "reply", "conversationId" }`
//! - `DELETE {base}/conversation/{id}` drops a conversation (any 2xx is success)
//!
//! The client keeps a cookie store so session cookies set by the service are
//! sent back on every request.

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

/// Standard User-Agent header for palaver requests.
pub const USER_AGENT: &str = concat!("palaver/", env!("CARGO_PKG_VERSION"));

/// Longest slice of a plain-text error body folded into an error message.
const MAX_BODY_IN_MESSAGE: usize = 200;

/// Body of a send request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    /// Serialized as `null` when no conversation exists yet.
    pub conversation_id: Option<String>,
}

/// Successful send response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub reply: String,
    pub conversation_id: String,
}

/// Category of a chat service failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
    /// Non-2xx HTTP status.
    HttpStatus,
    /// Request timed out.
    Timeout,
    /// Connection could not be established.
    Connect,
    /// Response body was not the expected JSON.
    Parse,
    /// Request could not be built or sent.
    Request,
}

impl fmt::Display for ServiceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceErrorKind::HttpStatus => write!(f, "http_status"),
            ServiceErrorKind::Timeout => write!(f, "timeout"),
            ServiceErrorKind::Connect => write!(f, "connect"),
            ServiceErrorKind::Parse => write!(f, "parse"),
            ServiceErrorKind::Request => write!(f, "request"),
        }
    }
}

/// Structured error from the chat service with kind and details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError {
    /// Error category
    pub kind: ServiceErrorKind,
    /// One-line summary suitable for display
    pub message: String,
    /// Optional additional details (e.g., raw error body)
    pub details: Option<String>,
}

impl ServiceError {
    pub fn new(kind: ServiceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    /// Creates an HTTP status error, surfacing the body text when present.
    pub fn http_status(status: u16, body: &str) -> Self {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return Self::new(ServiceErrorKind::HttpStatus, format!("HTTP {status}"));
        }

        let summary = json_error_message(trimmed).unwrap_or_else(|| truncate(trimmed));
        Self {
            kind: ServiceErrorKind::HttpStatus,
            message: format!("HTTP {status}: {summary}"),
            details: Some(body.to_string()),
        }
    }

    pub fn parse(message: impl Into<String>, body: &str) -> Self {
        Self {
            kind: ServiceErrorKind::Parse,
            message: message.into(),
            details: (!body.is_empty()).then(|| body.to_string()),
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ServiceError {}

/// Result type for chat service operations.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Extracts `error.message` or a top-level `error` string from a JSON body.
fn json_error_message(body: &str) -> Option<String> {
    let json = serde_json::from_str::<Value>(body).ok()?;
    let error = json.get("error")?;
    error
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| error.as_str())
        .map(str::to_string)
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_BODY_IN_MESSAGE {
        return text.to_string();
    }
    let mut out: String = text.chars().take(MAX_BODY_IN_MESSAGE).collect();
    out.push('…');
    out
}

/// Chat service client.
///
/// Cheap to clone; clones share the connection pool and cookie store.
#[derive(Debug, Clone)]
pub struct ChatClient {
    base_url: Url,
    http: reqwest::Client,
}

impl ChatClient {
    /// Creates a client for the service at `base_url`.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("Invalid chat service URL: {base_url}"))?;

        let mut builder = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to build HTTP client")?;

        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Sends a message and returns the service reply.
    ///
    /// # Errors
    /// Returns a `ServiceError` for transport failures, non-2xx statuses and
    /// bodies that are not a valid reply.
    pub async fn send_message(&self, request: &ChatRequest) -> ServiceResult<ChatReply> {
        tracing::debug!(
            url = %self.base_url,
            has_conversation = request.conversation_id.is_some(),
            "sending chat message"
        );

        let response = self
            .http
            .post(self.base_url.clone())
            .json(request)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        let body = response.text().await.map_err(classify_reqwest_error)?;
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), body = %body, "chat service returned an error");
            return Err(ServiceError::http_status(status.as_u16(), &body));
        }

        serde_json::from_str::<ChatReply>(&body)
            .map_err(|e| ServiceError::parse(format!("Invalid response body: {e}"), &body))
    }

    /// Deletes a conversation on the service. No response body is consumed.
    ///
    /// # Errors
    /// Returns a `ServiceError` for transport failures and non-2xx statuses.
    pub async fn delete_conversation(&self, conversation_id: &str) -> ServiceResult<()> {
        let url = self.conversation_url(conversation_id)?;
        tracing::debug!(%url, "deleting conversation");

        let response = self
            .http
            .delete(url)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "conversation delete failed");
            return Err(ServiceError::http_status(status.as_u16(), &body));
        }

        Ok(())
    }

    /// Builds `{base}/conversation/{id}` with the id as one encoded segment.
    fn conversation_url(&self, conversation_id: &str) -> ServiceResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                ServiceError::new(
                    ServiceErrorKind::Request,
                    format!("Chat service URL cannot take a path: {}", self.base_url),
                )
            })?
            .pop_if_empty()
            .push("conversation")
            .push(conversation_id);
        Ok(url)
    }
}

fn classify_reqwest_error(e: reqwest::Error) -> ServiceError {
    if e.is_timeout() {
        ServiceError::new(ServiceErrorKind::Timeout, format!("Request timed out: {e}"))
    } else if e.is_connect() {
        ServiceError::new(ServiceErrorKind::Connect, format!("Connection failed: {e}"))
    } else if e.is_decode() || e.is_body() {
        ServiceError::new(ServiceErrorKind::Parse, format!("Failed to read response: {e}"))
    } else if e.is_request() {
        ServiceError::new(ServiceErrorKind::Request, format!("Request error: {e}"))
    } else {
        ServiceError::new(ServiceErrorKind::Request, format!("Network error: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn request(message: &str, conversation_id: Option<&str>) -> ChatRequest {
        ChatRequest {
            message: message.to_string(),
            conversation_id: conversation_id.map(str::to_string),
        }
    }

    #[test]
    fn test_request_serializes_missing_conversation_as_null() {
        let json = serde_json::to_value(request("hi", None)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "message": "hi", "conversationId": null })
        );
    }

    #[test]
    fn test_http_status_extracts_json_message() {
        let err = ServiceError::http_status(429, r#"{"error":{"message":"Slow down"}}"#);
        assert_eq!(err.kind, ServiceErrorKind::HttpStatus);
        assert_eq!(err.message, "HTTP 429: Slow down");
        assert!(err.details.is_some());
    }

    #[test]
    fn test_http_status_plain_text_and_empty() {
        let err = ServiceError::http_status(502, "Bad gateway\n");
        assert_eq!(err.message, "HTTP 502: Bad gateway");

        let err = ServiceError::http_status(500, "");
        assert_eq!(err.message, "HTTP 500");
        assert_eq!(err.details, None);
    }

    #[test]
    fn test_conversation_url_encodes_id() {
        let client = ChatClient::new("http://localhost:3001/api/chat", None).unwrap();
        let url = client.conversation_url("a b/c").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:3001/api/chat/conversation/a%20b%2Fc"
        );

        let client = ChatClient::new("http://localhost:3001/api/chat/", None).unwrap();
        let url = client.conversation_url("abc").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3001/api/chat/conversation/abc");
    }

    #[tokio::test]
    async fn test_send_message_posts_json_and_parses_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({
                "message": "Hello",
                "conversationId": null
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "reply": "Hi there",
                "conversationId": "abc123"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ChatClient::new(&format!("{}/api/chat", server.uri()), None).unwrap();
        let reply = client.send_message(&request("Hello", None)).await.unwrap();

        assert_eq!(
            reply,
            ChatReply {
                reply: "Hi there".to_string(),
                conversation_id: "abc123".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_send_message_non_2xx_is_http_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = ChatClient::new(&server.uri(), None).unwrap();
        let err = client
            .send_message(&request("Hello", Some("abc")))
            .await
            .unwrap_err();

        assert_eq!(err.kind, ServiceErrorKind::HttpStatus);
        assert!(err.message.contains("500"), "got: {}", err.message);
        assert!(err.message.contains("boom"), "got: {}", err.message);
    }

    #[tokio::test]
    async fn test_send_message_malformed_body_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = ChatClient::new(&server.uri(), None).unwrap();
        let err = client.send_message(&request("Hello", None)).await.unwrap_err();

        assert_eq!(err.kind, ServiceErrorKind::Parse);
        assert_eq!(err.details.as_deref(), Some("not json"));
    }

    #[tokio::test]
    async fn test_send_message_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(2))
                    .set_body_json(serde_json::json!({ "reply": "late", "conversationId": "x" })),
            )
            .mount(&server)
            .await;

        let client = ChatClient::new(&server.uri(), Some(Duration::from_millis(100))).unwrap();
        let err = client.send_message(&request("Hello", None)).await.unwrap_err();

        assert_eq!(err.kind, ServiceErrorKind::Timeout);
        assert!(err.message.contains("timed out"));
    }

    #[tokio::test]
    async fn test_send_message_connection_refused() {
        let uri = {
            let server = MockServer::start().await;
            server.uri()
        };

        let client = ChatClient::new(&uri, None).unwrap();
        let err = client.send_message(&request("Hello", None)).await.unwrap_err();

        assert_eq!(err.kind, ServiceErrorKind::Connect);
    }

    #[tokio::test]
    async fn test_delete_conversation_hits_scoped_path() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/chat/conversation/abc123"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = ChatClient::new(&format!("{}/api/chat", server.uri()), None).unwrap();
        client.delete_conversation("abc123").await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_conversation_failure() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = ChatClient::new(&server.uri(), None).unwrap();
        let err = client.delete_conversation("gone").await.unwrap_err();

        assert_eq!(err.kind, ServiceErrorKind::HttpStatus);
        assert_eq!(err.message, "HTTP 404");
    }

    #[tokio::test]
    async fn test_cookies_are_sent_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("set-cookie", "sid=s3cr3t; Path=/")
                    .set_body_json(serde_json::json!({ "reply": "ok", "conversationId": "c1" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/conversation/c1"))
            .and(header("cookie", "sid=s3cr3t"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = ChatClient::new(&server.uri(), None).unwrap();
        client.send_message(&request("hi", None)).await.unwrap();
        client.delete_conversation("c1").await.unwrap();
    }
}
