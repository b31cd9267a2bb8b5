//! HTTP mock server helpers for testing outbound Portal calls.
//!
//! A thin wrapper around `wiremock` for declarative HTTP stubbing.
//!
//! # Quick Start
//!
//! ```ignore
//! use crate::common::http_mock::MockHttpServer;
//!
//! #[tokio::test]
//! async fn test_portal_call() {
//!     let server = MockHttpServer::start().await;
//!
//!     server
//!         .expect_get("/contacts")
//!         .with_header("X-API-Key", "test-key")
//!         .respond_with_json(json!({"success": true, ...}))
//!         .mount()
//!         .await;
//!
//!     let client = HttpPortalClient::new(server.url(), "test-key");
//! }
//! ```
//!
//! # Patterns
//!
//! - **Success response**: `.respond_with_json(value)` or `.respond_with_body(string)`
//! - **Error response**: `.respond_with_status(500)`, optionally `.with_json_response(value)`
//! - **Timeout simulation**: `.respond_with_delay(Duration::from_secs(30))`
//! - **Request verification**: `.expect_times(1)` then `server.verify().await`

#![allow(dead_code)]

use std::time::Duration;

use serde_json::Value;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockBuilder, MockServer, ResponseTemplate};

pub struct MockHttpServer {
    server: MockServer,
}

impl MockHttpServer {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL of the mock server (no trailing slash).
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// The underlying wiremock server, for matchers this wrapper lacks.
    pub fn inner(&self) -> &MockServer {
        &self.server
    }

    pub fn expect_get(&self, request_path: &str) -> StubBuilder<'_> {
        StubBuilder::new(&self.server, "GET", request_path)
    }

    pub fn expect_post(&self, request_path: &str) -> StubBuilder<'_> {
        StubBuilder::new(&self.server, "POST", request_path)
    }

    /// Assert that every mounted `expect_times` expectation was met.
    pub async fn verify(&self) {
        self.server.verify().await;
    }

    /// Number of requests the server has received so far.
    pub async fn received_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map_or(0, |requests| requests.len())
    }
}

enum StubBody {
    Json(Value),
    Raw(String),
}

pub struct StubBuilder<'a> {
    server: &'a MockServer,
    builder: MockBuilder,
    status: u16,
    body: Option<StubBody>,
    delay: Option<Duration>,
    expected: Option<u64>,
}

impl<'a> StubBuilder<'a> {
    fn new(server: &'a MockServer, http_method: &str, request_path: &str) -> Self {
        Self {
            server,
            builder: Mock::given(method(http_method)).and(path(request_path)),
            status: 200,
            body: None,
            delay: None,
            expected: None,
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.builder = self.builder.and(header(name, value));
        self
    }

    pub fn with_query(mut self, name: &str, value: &str) -> Self {
        self.builder = self.builder.and(query_param(name, value));
        self
    }

    pub fn with_json_body(mut self, expected: Value) -> Self {
        self.builder = self.builder.and(body_json(expected));
        self
    }

    pub fn respond_with_json(mut self, value: Value) -> Self {
        self.body = Some(StubBody::Json(value));
        self
    }

    pub fn respond_with_body(mut self, body: &str) -> Self {
        self.body = Some(StubBody::Raw(body.to_string()));
        self
    }

    pub fn respond_with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Attach a JSON body to a non-200 response.
    pub fn with_json_response(self, value: Value) -> Self {
        self.respond_with_json(value)
    }

    pub fn respond_with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn expect_times(mut self, times: u64) -> Self {
        self.expected = Some(times);
        self
    }

    pub async fn mount(self) {
        let mut template = ResponseTemplate::new(self.status);
        template = match self.body {
            Some(StubBody::Json(value)) => template.set_body_json(value),
            Some(StubBody::Raw(body)) => template.set_body_string(body),
            None => template,
        };
        if let Some(delay) = self.delay {
            template = template.set_delay(delay);
        }

        let mut mock = self.builder.respond_with(template);
        if let Some(times) = self.expected {
            mock = mock.expect(times);
        }
        mock.mount(self.server).await;
    }
}
