use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use super::error::ApiError;
use super::retry::RetryPolicy;

/// Bounds for the per-attempt timeout, in seconds
pub const MIN_TIMEOUT_SECS: u64 = 10;
pub const MAX_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

/// One call against the backend's auth or table endpoints
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path below the project URL, e.g. `/rest/v1/trades`
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    /// PostgREST `Prefer` header
    pub prefer: Option<String>,
    /// Explicit bearer token; when absent the session token (if any) is used
    pub bearer: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            prefer: None,
            bearer: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn prefer(mut self, prefer: &str) -> Self {
        self.prefer = Some(prefer.to_string());
        self
    }

    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Raw answer: status plus body text. Non-2xx answers are turned into
/// errors by [`BackendClient`], not by the transport.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_str(&self.body).map_err(|e| {
            ApiError::ParseError(format!("Failed to parse response: {} - Body: {}", e, self.body))
        })
    }
}

/// Wire-level seam: sends one request, no retries, no timeout
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError>;
}

/// Remote data access with the current session token, per-attempt timeout
/// and the injected retry policy.
pub struct BackendClient {
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
    timeout: Duration,
    access_token: RwLock<Option<String>>,
}

impl BackendClient {
    pub fn new(transport: Arc<dyn Transport>, retry: RetryPolicy, timeout: Duration) -> Self {
        Self {
            transport,
            retry,
            timeout,
            access_token: RwLock::new(None),
        }
    }

    /// Token attached as `Authorization: Bearer` to subsequent calls
    pub fn set_access_token(&self, token: Option<String>) {
        let mut guard = self.access_token.write().unwrap_or_else(|e| e.into_inner());
        *guard = token;
    }

    pub fn has_access_token(&self) -> bool {
        self.access_token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// Execute with retries; the last failure is returned to the caller
    pub async fn execute(&self, label: &str, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let request = self.authorize(request);
        let this = self;
        let req = &request;
        self.retry
            .run(label, move |_| async move { this.attempt(req).await })
            .await
    }

    /// Execute once, no retries. Used where failure is tolerated anyway.
    pub async fn execute_once(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let request = self.authorize(request);
        self.attempt(&request).await
    }

    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        label: &str,
        request: ApiRequest,
    ) -> Result<T, ApiError> {
        self.execute(label, request).await?.json()
    }

    fn authorize(&self, mut request: ApiRequest) -> ApiRequest {
        if request.bearer.is_none() {
            request.bearer = self
                .access_token
                .read()
                .unwrap_or_else(|e| e.into_inner())
                .clone();
        }
        request
    }

    async fn attempt(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        log::debug!("{} {}", request.method.as_str(), request.path);

        let response = tokio::time::timeout(self.timeout, self.transport.send(request))
            .await
            .map_err(|_| ApiError::Timeout(self.timeout.as_secs()))??;

        if response.is_success() {
            Ok(response)
        } else {
            Err(decode_error(response.status, &response.body))
        }
    }
}

/// Clamp a configured timeout into the supported window
pub fn clamp_timeout(secs: u64) -> Duration {
    Duration::from_secs(secs.clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS))
}

/// Decode an error body from either PostgREST (`message`, `code`) or the
/// auth service (`msg`, `error_description`, `error`, `error_code`).
pub fn decode_error(status: u16, body: &str) -> ApiError {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();

    let text = |value: &serde_json::Value, key: &str| -> Option<String> {
        match value.get(key)? {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    };

    let (message, code) = match &parsed {
        Some(value) => {
            let message = ["msg", "message", "error_description", "error"]
                .iter()
                .find_map(|key| text(value, *key));
            let code = ["code", "error_code"].iter().find_map(|key| text(value, *key));
            (message, code)
        }
        None => (None, None),
    };

    let message = message.unwrap_or_else(|| {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            format!("HTTP {}", status)
        } else {
            trimmed.to_string()
        }
    });

    ApiError::Backend {
        status,
        code,
        message,
    }
}

#[cfg(test)]
pub mod mock {
    //! Scripted in-memory transport used across the crate's tests
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    #[derive(Debug, Clone)]
    pub enum Reply {
        Status(u16, String),
        Hang(Duration),
    }

    #[derive(Default)]
    pub struct ScriptedTransport {
        routes: Mutex<HashMap<(&'static str, String), VecDeque<Reply>>>,
        requests: Mutex<Vec<ApiRequest>>,
    }

    impl ScriptedTransport {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        /// Queue a reply for `method path`. The last queued reply for a
        /// route is repeated once the queue is down to one entry.
        pub fn reply(&self, method: Method, path: &str, status: u16, body: &str) {
            self.push(method, path, Reply::Status(status, body.to_string()));
        }

        pub fn push(&self, method: Method, path: &str, reply: Reply) {
            self.routes
                .lock()
                .unwrap()
                .entry((method.as_str(), path.to_string()))
                .or_default()
                .push_back(reply);
        }

        pub fn requests(&self) -> Vec<ApiRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub fn count(&self, method: Method, path: &str) -> usize {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.method == method && r.path == path)
                .count()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
            self.requests.lock().unwrap().push(request.clone());

            let reply = {
                let mut routes = self.routes.lock().unwrap();
                match routes.get_mut(&(request.method.as_str(), request.path.clone())) {
                    Some(queue) if queue.len() > 1 => queue.pop_front(),
                    Some(queue) => queue.front().cloned(),
                    None => None,
                }
            };

            match reply {
                Some(Reply::Status(status, body)) => Ok(ApiResponse { status, body }),
                Some(Reply::Hang(duration)) => {
                    tokio::time::sleep(duration).await;
                    Ok(ApiResponse {
                        status: 200,
                        body: "[]".to_string(),
                    })
                }
                None => Ok(ApiResponse {
                    status: 404,
                    body: format!(r#"{{"message":"no route for {}"}}"#, request.path),
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::{Reply, ScriptedTransport};
    use super::*;

    fn client(transport: Arc<ScriptedTransport>) -> BackendClient {
        BackendClient::new(transport, RetryPolicy::immediate(3), Duration::from_millis(100))
    }

    #[test]
    fn test_decode_postgrest_error() {
        let err = decode_error(
            400,
            r#"{"code":"PGRST116","message":"JSON object requested, multiple (or no) rows returned"}"#,
        );
        assert_eq!(err.code(), Some("PGRST116"));
        assert!(err.user_message().starts_with("JSON object requested"));
    }

    #[test]
    fn test_decode_auth_error() {
        let err = decode_error(
            400,
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        );
        assert_eq!(err.user_message(), "Invalid login credentials");

        let err = decode_error(422, r#"{"code":422,"error_code":"user_already_exists","msg":"User already registered"}"#);
        assert_eq!(err.user_message(), "User already registered");
        assert_eq!(err.code(), Some("422"));
    }

    #[test]
    fn test_decode_non_json_error() {
        assert_eq!(decode_error(502, "Bad Gateway").user_message(), "Bad Gateway");
        assert_eq!(decode_error(500, "").user_message(), "HTTP 500");
    }

    #[test]
    fn test_clamp_timeout() {
        assert_eq!(clamp_timeout(3), Duration::from_secs(10));
        assert_eq!(clamp_timeout(12), Duration::from_secs(12));
        assert_eq!(clamp_timeout(60), Duration::from_secs(15));
    }

    #[tokio::test]
    async fn test_bearer_attached_only_with_session() {
        let transport = ScriptedTransport::new();
        transport.reply(Method::Get, "/rest/v1/trades", 200, "[]");
        let backend = client(transport.clone());

        backend.execute("anon", ApiRequest::get("/rest/v1/trades")).await.unwrap();
        backend.set_access_token(Some("jwt-1".to_string()));
        backend.execute("authed", ApiRequest::get("/rest/v1/trades")).await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].bearer, None);
        assert_eq!(requests[1].bearer.as_deref(), Some("jwt-1"));
    }

    #[tokio::test]
    async fn test_fails_twice_then_succeeds() {
        let transport = ScriptedTransport::new();
        transport.reply(Method::Get, "/rest/v1/trades", 503, "unavailable");
        transport.reply(Method::Get, "/rest/v1/trades", 500, "boom");
        transport.reply(Method::Get, "/rest/v1/trades", 200, r#"[{"ok":true}]"#);
        let backend = client(transport.clone());

        let rows: Vec<serde_json::Value> = backend
            .fetch_json("load", ApiRequest::get("/rest/v1/trades"))
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(transport.count(Method::Get, "/rest/v1/trades"), 3);
    }

    #[tokio::test]
    async fn test_attempt_timeout() {
        let transport = ScriptedTransport::new();
        transport.push(Method::Get, "/slow", Reply::Hang(Duration::from_secs(5)));
        let backend = BackendClient::new(
            transport.clone(),
            RetryPolicy::immediate(2),
            Duration::from_millis(20),
        );

        let result = backend.execute("slow", ApiRequest::get("/slow")).await;

        assert!(matches!(result, Err(ApiError::Timeout(_))));
        assert_eq!(transport.count(Method::Get, "/slow"), 2);
    }

    #[test]
    fn test_request_builder() {
        let request = ApiRequest::get("/rest/v1/trades")
            .query("select", "*")
            .query("order", "date.desc");
        assert_eq!(request.query_value("order"), Some("date.desc"));
        assert_eq!(request.query_value("missing"), None);
    }
}
