// ABOUTME: Axum HTTP testing utilities for integration tests
// ABOUTME: Provides helpers to test Axum routes without running a full server

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, Response, StatusCode},
    Router,
};
use serde::{de::DeserializeOwned, Serialize};
use tower::ServiceExt;

/// Helper to build and execute HTTP requests against Axum routers
pub struct AxumTestRequest {
    method: Method,
    uri: String,
    headers: Vec<(String, String)>,
    body: Option<String>,
}

impl AxumTestRequest {
    fn new(method: Method, uri: &str) -> Self {
        Self {
            method,
            uri: uri.to_owned(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Create a new GET request
    pub fn get(uri: &str) -> Self {
        Self::new(Method::GET, uri)
    }

    /// Create a new POST request
    pub fn post(uri: &str) -> Self {
        Self::new(Method::POST, uri)
    }

    /// Create a new PUT request
    #[allow(dead_code)]
    pub fn put(uri: &str) -> Self {
        Self::new(Method::PUT, uri)
    }

    /// Create a new PATCH request
    #[allow(dead_code)]
    pub fn patch(uri: &str) -> Self {
        Self::new(Method::PATCH, uri)
    }

    /// Create a new DELETE request
    #[allow(dead_code)]
    pub fn delete(uri: &str) -> Self {
        Self::new(Method::DELETE, uri)
    }

    /// Add a header to the request
    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.headers.push((key.to_owned(), value.to_owned()));
        self
    }

    /// Authenticate with `Authorization: Token <token>`
    pub fn token(self, token: &str) -> Self {
        self.header(header::AUTHORIZATION.as_str(), &format!("Token {token}"))
    }

    /// Add JSON body to the request
    pub fn json<T: Serialize>(mut self, data: &T) -> Self {
        self.body = Some(serde_json::to_string(data).expect("Failed to serialize JSON"));
        self.headers.push((
            header::CONTENT_TYPE.as_str().to_owned(),
            "application/json".to_owned(),
        ));
        self
    }

    /// Send `raw` as a JSON body without serializing it
    #[allow(dead_code)]
    pub fn raw_json(mut self, raw: &str) -> Self {
        self.body = Some(raw.to_owned());
        self.headers.push((
            header::CONTENT_TYPE.as_str().to_owned(),
            "application/json".to_owned(),
        ));
        self
    }

    /// Execute the request against an Axum router
    pub async fn send(self, app: Router) -> AxumTestResponse {
        let mut builder = Request::builder().method(self.method).uri(self.uri);

        for (key, value) in self.headers {
            builder = builder.header(key, value);
        }

        let body = self.body.unwrap_or_default();
        let request = builder
            .body(Body::from(body))
            .expect("Failed to build request");

        let response = app
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        AxumTestResponse::from_response(response).await
    }
}

/// Wrapper around Axum HTTP response for testing
pub struct AxumTestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl AxumTestResponse {
    /// Create from response by eagerly reading the body
    async fn from_response(response: Response<Body>) -> Self {
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body")
            .to_vec();
        Self {
            status,
            headers,
            body,
        }
    }

    /// Get the response status code as u16 for easy assertion
    pub const fn status(&self) -> u16 {
        self.status.as_u16()
    }

    /// Get the response status code as `StatusCode`
    #[allow(dead_code)]
    pub const fn status_code(&self) -> StatusCode {
        self.status
    }

    /// A response header as text
    #[allow(dead_code)]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Get the response body as bytes
    #[allow(dead_code)]
    pub fn bytes(self) -> Vec<u8> {
        self.body
    }

    /// Get the response body as a JSON value
    pub fn json<T: DeserializeOwned>(self) -> T {
        serde_json::from_slice(&self.body).unwrap_or_else(|e| {
            panic!(
                "Failed to deserialize JSON response ({e}): {}",
                String::from_utf8_lossy(&self.body)
            )
        })
    }

    /// Get the response body as a string
    #[allow(dead_code)]
    pub fn text(self) -> String {
        String::from_utf8(self.body).expect("Failed to decode response as UTF-8")
    }

    /// Assert that the status code matches, showing the body on failure
    pub fn assert_status(self, expected: StatusCode) -> Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {}, got {}: {}",
            expected,
            self.status,
            String::from_utf8_lossy(&self.body)
        );
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        routing::{get, post},
        Json,
    };
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_axum_test_request_get() {
        let app = Router::new().route("/test", get(|| async { "Hello" }));
        let response = AxumTestRequest::get("/test").send(app).await;
        assert_eq!(response.status(), 200);
        assert_eq!(response.text(), "Hello");
    }

    #[tokio::test]
    async fn test_axum_test_request_post_with_json() {
        let app = Router::new().route(
            "/test",
            post(|Json(body): Json<Value>| async move { Json(json!({"received": body})) }),
        );
        let response = AxumTestRequest::post("/test")
            .json(&json!({"key": "value"}))
            .send(app)
            .await;
        assert_eq!(response.status(), 200);
        let json: Value = response.json();
        assert_eq!(json["received"]["key"], "value");
    }

    #[tokio::test]
    async fn test_token_sets_authorization_header() {
        let app = Router::new().route(
            "/test",
            get(|headers: HeaderMap| async move {
                headers
                    .get(header::AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("missing")
                    .to_owned()
            }),
        );
        let response = AxumTestRequest::get("/test").token("abc").send(app).await;
        assert_eq!(response.text(), "Token abc");
    }
}
