//! The authenticated transport layer. Repositories call `ApiClient::request`, which attaches the
//! session's bearer token, sends the request through a `Transport`, and classifies the response.
//!
//! `Transport` is the seam: `HttpTransport` talks to a real server over HTTPS and `TestServer`
//! implements the same REST contract in memory.

mod http;
mod test_server;

use crate::error::FieldErrors;
use crate::session::SessionStore;
use crate::{Config, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{debug, trace};

pub use http::HttpTransport;
pub use test_server::TestServer;

/// Environment variable that switches the app to the in-memory server.
pub const TEST_MODE_ENV: &str = "BUDGET_IN_TEST_MODE";

/// Selects which `Transport` backs the `ApiClient`.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum Mode {
    /// Send requests to the server at the configured base URL.
    #[default]
    Http,
    /// Serve requests from an in-memory `TestServer` seeded with sample data.
    Test,
}

impl Mode {
    /// When `BUDGET_IN_TEST_MODE` is set and non-empty the mode is `Mode::Test`, otherwise
    /// `Mode::Http`.
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::Http,
        }
    }
}

/// HTTP methods used by the REST contract.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

serde_plain::derive_display_from_serialize!(Method);
serde_plain::derive_fromstr_from_deserialize!(Method);

/// A fully built request, ready for a `Transport`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the base URL, e.g. `get-category/3/`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl ApiRequest {
    /// Returns the value of the first header named `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// The status code and body text of a response, before classification.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json(status: u16, value: &Value) -> Self {
        Self::new(status, value.to_string())
    }
}

/// Sends an `ApiRequest` and returns the raw response. An `Err` means the request never produced
/// a response (connection refused, DNS failure, TLS error, and so on).
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse>;
}

/// The classification of a failed request.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// `400` with a field error object.
    #[error("validation failed\n{0}")]
    Validation(FieldErrors),
    /// `401` or `403`.
    #[error("the server rejected the credentials")]
    Unauthorized,
    /// `404`.
    #[error("the requested item was not found")]
    NotFound,
    /// Any other failure status, or a body that does not have the expected shape.
    #[error("server error: {0}")]
    Server(String),
    /// No response was received.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Attaches the session's token to each request and classifies the response. Cheap to clone; all
/// clones share the transport and the session.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    session: SessionStore,
}

impl ApiClient {
    pub fn new(transport: impl Transport + 'static, session: SessionStore) -> Self {
        Self {
            transport: Arc::new(transport),
            session,
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Sends a request without query parameters.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> std::result::Result<Value, ApiError> {
        self.request_with_query(method, path, Vec::new(), body).await
    }

    /// Sends a request. The token is read from the session now, not when the client was created.
    pub async fn request_with_query(
        &self,
        method: Method,
        path: &str,
        query: Vec<(String, String)>,
        body: Option<&Value>,
    ) -> std::result::Result<Value, ApiError> {
        let request = self.build(method, path, query, body);
        trace!("{} {}", request.method, request.path);
        let response = self
            .transport
            .send(&request)
            .await
            .map_err(|e| ApiError::Transport(format!("{e:#}")))?;
        let classified = classify(response);
        if let Err(e) = &classified {
            debug!("{} {} failed: {e}", request.method, request.path);
        }
        classified
    }

    fn build(
        &self,
        method: Method,
        path: &str,
        query: Vec<(String, String)>,
        body: Option<&Value>,
    ) -> ApiRequest {
        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        if let Some(token) = self.session.token() {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }
        ApiRequest {
            method,
            path: path.trim_start_matches('/').to_string(),
            query,
            headers,
            body: body.map(Value::to_string),
        }
    }
}

impl Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("session", &self.session)
            .finish()
    }
}

/// Creates an `ApiClient` for `mode`. In `Mode::Test` the client is backed by a fresh
/// `TestServer` with its default seed data.
pub fn client(config: &Config, session: SessionStore, mode: Mode) -> Result<ApiClient> {
    match mode {
        Mode::Http => Ok(ApiClient::new(
            HttpTransport::new(config.base_url().clone())?,
            session,
        )),
        Mode::Test => Ok(ApiClient::new(TestServer::default(), session)),
    }
}

/// Turns a raw response into the parsed JSON body or an `ApiError`.
pub(crate) fn classify(response: RawResponse) -> std::result::Result<Value, ApiError> {
    let RawResponse { status, body } = response;
    match status {
        200..=299 => {
            if body.trim().is_empty() {
                return Ok(Value::Object(Default::default()));
            }
            serde_json::from_str(&body)
                .map_err(|e| ApiError::Server(format!("unreadable response body: {e}")))
        }
        400 => {
            let parsed = serde_json::from_str::<Value>(&body).ok();
            match parsed.as_ref().and_then(FieldErrors::from_json) {
                Some(errors) => Err(ApiError::Validation(errors)),
                None => Err(ApiError::Server(detail(status, &body))),
            }
        }
        401 | 403 => Err(ApiError::Unauthorized),
        404 => Err(ApiError::NotFound),
        _ => Err(ApiError::Server(detail(status, &body))),
    }
}

/// Pulls a human-readable message out of an error body. Django REST framework uses `detail`,
/// the BudgetPlanner views use `message`.
fn detail(status: u16, body: &str) -> String {
    let message = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        ["detail", "message", "error"]
            .iter()
            .find_map(|key| v.get(*key).and_then(Value::as_str).map(str::to_string))
    });
    match message {
        Some(message) => format!("status {status}: {message}"),
        None => format!("status {status}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    /// Replies with a fixed response and remembers the last request.
    struct Canned {
        response: RawResponse,
        last: Arc<Mutex<Option<ApiRequest>>>,
    }

    #[async_trait::async_trait]
    impl Transport for Canned {
        async fn send(&self, request: &ApiRequest) -> Result<RawResponse> {
            *self.last.lock().unwrap() = Some(request.clone());
            Ok(self.response.clone())
        }
    }

    struct Unreachable;

    #[async_trait::async_trait]
    impl Transport for Unreachable {
        async fn send(&self, _: &ApiRequest) -> Result<RawResponse> {
            anyhow::bail!("connection refused")
        }
    }

    fn canned(status: u16, body: &str) -> (ApiClient, Arc<Mutex<Option<ApiRequest>>>) {
        let last = Arc::new(Mutex::new(None));
        let transport = Canned {
            response: RawResponse::new(status, body),
            last: last.clone(),
        };
        (ApiClient::new(transport, SessionStore::new()), last)
    }

    #[tokio::test]
    async fn test_no_token_omits_authorization() {
        let (client, last) = canned(200, "[]");
        client.request(Method::Get, "list-categories/", None).await.unwrap();
        let request = last.lock().unwrap().clone().unwrap();
        assert!(request.header("Authorization").is_none());
        assert_eq!(request.header("content-type"), Some("application/json"));
    }

    #[tokio::test]
    async fn test_token_is_read_at_call_time() {
        let (client, last) = canned(200, "{}");
        client.session().set_token("abc");
        client.request(Method::Get, "get-balance/", None).await.unwrap();
        let request = last.lock().unwrap().clone().unwrap();
        assert_eq!(request.header("Authorization"), Some("Bearer abc"));

        client.session().set_token("xyz");
        client.request(Method::Get, "get-balance/", None).await.unwrap();
        let request = last.lock().unwrap().clone().unwrap();
        assert_eq!(request.header("Authorization"), Some("Bearer xyz"));
    }

    #[tokio::test]
    async fn test_body_is_serialized() {
        let (client, last) = canned(201, r#"{"id": 1, "name": "Food"}"#);
        let body = json!({"name": "Food"});
        let value = client
            .request(Method::Post, "/create-category/", Some(&body))
            .await
            .unwrap();
        assert_eq!(value["id"], 1);
        let request = last.lock().unwrap().clone().unwrap();
        assert_eq!(request.path, "create-category/");
        assert_eq!(request.body.as_deref(), Some(r#"{"name":"Food"}"#));
    }

    #[test]
    fn test_classify_empty_success_is_empty_object() {
        assert_eq!(classify(RawResponse::new(204, "")).unwrap(), json!({}));
    }

    #[test]
    fn test_classify_success_with_bad_json() {
        let err = classify(RawResponse::new(200, "<html>")).unwrap_err();
        assert!(matches!(err, ApiError::Server(_)));
    }

    #[test]
    fn test_classify_validation_keeps_fields() {
        let err = classify(RawResponse::new(400, r#"{"amount": ["must be positive"]}"#))
            .unwrap_err();
        let ApiError::Validation(errors) = err else {
            panic!("expected a validation error, got {err:?}");
        };
        assert_eq!(errors.get("amount").unwrap(), ["must be positive"]);
    }

    #[test]
    fn test_classify_400_with_unexpected_shape() {
        let err = classify(RawResponse::new(400, "not json")).unwrap_err();
        assert_eq!(err, ApiError::Server("status 400".to_string()));
    }

    #[test]
    fn test_classify_auth_and_not_found() {
        assert_eq!(
            classify(RawResponse::new(401, "")).unwrap_err(),
            ApiError::Unauthorized
        );
        assert_eq!(
            classify(RawResponse::new(403, r#"{"detail": "nope"}"#)).unwrap_err(),
            ApiError::Unauthorized
        );
        assert_eq!(
            classify(RawResponse::new(404, r#"{"detail": "Not found."}"#)).unwrap_err(),
            ApiError::NotFound
        );
    }

    #[test]
    fn test_classify_server_error_detail() {
        let err = classify(RawResponse::new(500, r#"{"detail": "boom"}"#)).unwrap_err();
        assert_eq!(err, ApiError::Server("status 500: boom".to_string()));
        let err = classify(RawResponse::new(502, "<html>Bad Gateway</html>")).unwrap_err();
        assert_eq!(err, ApiError::Server("status 502".to_string()));
    }

    #[tokio::test]
    async fn test_transport_failure() {
        let client = ApiClient::new(Unreachable, SessionStore::new());
        let err = client
            .request(Method::Get, "list-categories/", None)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ApiError::Transport("connection refused".to_string())
        );
    }

    #[test]
    fn test_method_display() {
        assert_eq!(Method::Patch.to_string(), "PATCH");
        assert_eq!("DELETE".parse::<Method>().unwrap(), Method::Delete);
    }
}
