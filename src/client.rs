use derivative::Derivative;
use http::{header::CONTENT_TYPE, HeaderMap, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    error::{DecodeError, TransportError},
    utils::body_len_fmt,
};

pub const APPLICATION_JSON: &str = "application/json";

/// A request relative to the base URL of an [`ApiClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<String>,
    pub content_type: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            content_type: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Sets the raw body and the `application/json` content type.
    pub fn json_body(self, body: impl Into<String>) -> Self {
        self.body(body).content_type(APPLICATION_JSON)
    }

    pub fn describe(&self) -> String {
        format!("{} /{}", self.method, self.path.trim_start_matches('/'))
    }
}

/// A received HTTP response, whatever its status.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    #[derivative(Debug(format_with = "body_len_fmt"))]
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    /// Looks up a dotted field path (`book.title`, `books.0.id`) in the JSON body.
    pub fn json_field(&self, path: &str) -> Option<Value> {
        let json = self.json().ok()?;

        field_at(&json, path).cloned()
    }

    pub fn deserialize<T: DeserializeOwned>(&self, what: &'static str) -> Result<T, DecodeError> {
        serde_json::from_str(&self.body).map_err(|source| DecodeError { what, source })
    }

    /// The body pretty-printed when it is JSON, verbatim otherwise.
    pub fn pretty_body(&self) -> String {
        self.json()
            .ok()
            .and_then(|json| serde_json::to_string_pretty(&json).ok())
            .unwrap_or_else(|| self.body.clone())
    }
}

pub(crate) fn field_at<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(value, |value, segment| match value {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

/// Sends [`ApiRequest`]s against a fixed base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, http_client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            http_client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    #[tracing::instrument(name = "send", skip_all, fields(method = %request.method, path = %request.path))]
    pub async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let raw_url = self.url_for(&request.path);
        let url = reqwest::Url::parse(&raw_url).map_err(|err| TransportError::InvalidUrl {
            url: raw_url.clone(),
            reason: err.to_string(),
        })?;

        let mut builder = self.http_client.request(request.method.clone(), url);

        if let Some(content_type) = &request.content_type {
            builder = builder.header(CONTENT_TYPE, content_type.as_str());
        }

        if let Some(body) = &request.body {
            tracing::trace!(%body, "Request body");

            builder = builder.body(body.clone());
        }

        tracing::debug!(url = %raw_url, "Sending");

        let response = builder
            .send()
            .await
            .map_err(|err| TransportError::from_send_error(&raw_url, err))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(|source| TransportError::Body {
            url: raw_url.clone(),
            source,
        })?;

        tracing::debug!(%status, "Received");
        tracing::trace!(%body, "Response body");

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        http::{HeaderMap as AxumHeaderMap, Method as AxumMethod},
        response::IntoResponse,
        routing::any,
        Json, Router,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tokio::net::TcpListener;

    use super::*;

    async fn echo(method: AxumMethod, headers: AxumHeaderMap, body: String) -> impl IntoResponse {
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();

        (
            [("x-echo-method", method.to_string())],
            Json(json!({
                "method": method.as_str(),
                "content_type": content_type,
                "body": body,
            })),
        )
    }

    async fn spawn_echo_server() -> String {
        let app = Router::new().route("/api/echo", any(echo));
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bindable");
        let addr = listener.local_addr().expect("bound");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("server runs");
        });

        format!("http://{addr}/api")
    }

    #[test]
    fn url_for_joins_without_duplicate_slashes() {
        let client = ApiClient::new("https://example.org/api/");

        assert_eq!(client.url_for("/books"), "https://example.org/api/books");
        assert_eq!(client.url_for("books/1"), "https://example.org/api/books/1");
    }

    #[test]
    fn json_field_follows_dotted_paths() {
        let response = ApiResponse::new(
            StatusCode::OK,
            r#"{"book":{"title":"X"},"books":[{"id":3}]}"#,
        );

        assert_eq!(response.json_field("book.title"), Some(json!("X")));
        assert_eq!(response.json_field("books.0.id"), Some(json!(3)));
        assert_eq!(response.json_field("book.missing"), None);
    }

    #[test]
    fn pretty_body_keeps_non_json_verbatim() {
        let response = ApiResponse::new(StatusCode::NOT_FOUND, "Cannot GET /bookz");

        assert_eq!(response.pretty_body(), "Cannot GET /bookz");
    }

    #[tokio::test]
    async fn send_returns_status_headers_and_body() {
        let client = ApiClient::new(spawn_echo_server().await);
        let request = ApiRequest::put("/echo").json_body(r#"{"status":"reading"}"#);

        let response = client.send(&request).await.expect("server is reachable");

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(
            response.headers.get("x-echo-method").and_then(|v| v.to_str().ok()),
            Some("PUT")
        );
        assert_eq!(response.json_field("content_type"), Some(json!(APPLICATION_JSON)));
        assert_eq!(response.json_field("body"), Some(json!(r#"{"status":"reading"}"#)));
    }

    #[tokio::test]
    async fn send_without_body_sends_no_content_type() {
        let client = ApiClient::new(spawn_echo_server().await);

        let response = client
            .send(&ApiRequest::delete("echo"))
            .await
            .expect("server is reachable");

        assert_eq!(response.json_field("method"), Some(json!("DELETE")));
        assert_eq!(response.json_field("content_type"), Some(json!("")));
        assert_eq!(response.json_field("body"), Some(json!("")));
    }

    #[tokio::test]
    async fn error_status_is_a_response_not_an_error() {
        let client = ApiClient::new(spawn_echo_server().await);

        let response = client
            .send(&ApiRequest::get("/bookz"))
            .await
            .expect("server is reachable");

        assert_eq!(response.status_code(), 404);
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bindable");
        let addr = listener.local_addr().expect("bound");
        drop(listener);

        let client = ApiClient::new(format!("http://{addr}/api"));
        let err = client
            .send(&ApiRequest::get("/books"))
            .await
            .expect_err("nothing listens on the port");

        assert!(matches!(err, TransportError::Connect { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn malformed_base_url_is_a_transport_error() {
        let client = ApiClient::new("not a url");

        let err = client
            .send(&ApiRequest::get("/books"))
            .await
            .expect_err("URL cannot be parsed");

        assert!(matches!(err, TransportError::InvalidUrl { .. }), "{err:?}");
    }
}
