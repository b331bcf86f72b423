//! HTTP test client.
//!
//! [`TestClient`] sends requests straight through an Axum [`Router`] with
//! `tower::ServiceExt::oneshot`; [`TestResponse`] holds the result.
//!
//! ```rust,no_run
//! use axum::routing::get;
//! use axum::Router;
//! use compdeps_test::client::TestClient;
//!
//! async fn example() {
//!     let app = Router::new().route("/hello", get(|| async { "Hello" }));
//!     let client = TestClient::new(app);
//!     let response = client.get("/hello").await;
//!     assert_eq!(response.status_code(), 200);
//! }
//! ```

use axum::body::Body;
use axum::Router;
use bytes::Bytes;
use http::{HeaderMap, Method, Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use compdeps_core::DepsError;

/// Makes simulated requests against a router.
#[derive(Clone)]
pub struct TestClient {
    app: Router,
}

impl TestClient {
    /// Wraps a router.
    pub const fn new(app: Router) -> Self {
        Self { app }
    }

    /// Sends a GET request.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(Method::GET, path, &[]).await
    }

    /// Sends a GET request with extra headers.
    pub async fn get_with_headers(&self, path: &str, headers: &[(&str, &str)]) -> TestResponse {
        self.request(Method::GET, path, headers).await
    }

    /// Sends a HEAD request.
    pub async fn head(&self, path: &str) -> TestResponse {
        self.request(Method::HEAD, path, &[]).await
    }

    /// Sends a request with no body.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let req = builder
            .body(Body::empty())
            .expect("request builder should not fail");
        self.send(req).await
    }

    async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(req)
            .await
            .expect("router should not error");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .map_or_else(|_| Bytes::new(), http_body_util::Collected::to_bytes);

        TestResponse {
            status,
            headers,
            body: body.to_vec(),
        }
    }
}

/// The response to a test request.
#[derive(Debug)]
pub struct TestResponse {
    /// The status code.
    pub status: StatusCode,
    /// The response headers.
    pub headers: HeaderMap,
    /// The raw body.
    pub body: Vec<u8>,
}

impl TestResponse {
    /// The body as UTF-8 text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Deserializes the body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, DepsError> {
        serde_json::from_slice(&self.body).map_err(|e| DepsError::Serialization(e.to_string()))
    }

    /// The numeric status code.
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// A header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Whether the body contains `text`.
    pub fn contains(&self, text: &str) -> bool {
        self.text().contains(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;

    fn app() -> Router {
        Router::new()
            .route("/hello", get(|| async { "Hello" }))
            .route(
                "/echo-header",
                get(|headers: HeaderMap| async move {
                    headers
                        .get("x-probe")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("none")
                        .to_string()
                }),
            )
            .route("/json", get(|| async { axum::Json(serde_json::json!({"ok": true})) }))
    }

    #[tokio::test]
    async fn test_get() {
        let response = TestClient::new(app()).get("/hello").await;
        assert_eq!(response.status_code(), 200);
        assert_eq!(response.text(), "Hello");
        assert!(response.contains("ell"));
    }

    #[tokio::test]
    async fn test_headers_forwarded() {
        let client = TestClient::new(app());
        let response = client.get_with_headers("/echo-header", &[("x-probe", "1")]).await;
        assert_eq!(response.text(), "1");
    }

    #[tokio::test]
    async fn test_json_and_missing_route() {
        let client = TestClient::new(app());
        let value: serde_json::Value = client.get("/json").await.json().unwrap();
        assert_eq!(value["ok"], true);
        assert_eq!(client.get("/nope").await.status_code(), 404);
    }
}
