//! Mock forward destination built on wiremock.

use std::time::Duration;

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde_json::Value;
use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer as WiremockServer, ResponseTemplate,
};

use crate::TEST_AUTHORIZATION;

/// How the mock destination answers forwards.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// 200 with an empty body.
    Accept,
    /// Given status with an empty body.
    Reject {
        /// Status to answer with
        status: StatusCode,
    },
    /// 200 after a delay.
    Slow {
        /// Delay before responding
        delay: Duration,
    },
}

/// A forward captured by the mock destination.
#[derive(Debug, Clone)]
pub struct ReceivedForward {
    /// Request method.
    pub method: String,
    /// Request path.
    pub path: String,
    /// Request headers.
    pub headers: HeaderMap,
    /// Raw request body.
    pub body: Bytes,
}

impl ReceivedForward {
    /// Value of the `Authorization` header, if present.
    pub fn authorization(&self) -> Option<&str> {
        self.headers.get("authorization").and_then(|v| v.to_str().ok())
    }

    /// Body parsed as JSON.
    ///
    /// # Panics
    ///
    /// Panics if the body is not JSON.
    #[allow(clippy::expect_used)]
    pub fn json_body(&self) -> Value {
        serde_json::from_slice(&self.body).expect("forward body should be JSON")
    }
}

/// HTTP destination that records every forward it receives.
pub struct MockDestination {
    server: WiremockServer,
}

impl MockDestination {
    /// Starts a destination on a random port that accepts every POST to `/`.
    pub async fn start() -> Self {
        let destination = Self::start_empty().await;
        destination.respond_with(MockResponse::Accept).await;
        destination
    }

    /// Starts a destination with no responses mounted.
    pub async fn start_empty() -> Self {
        Self { server: WiremockServer::start().await }
    }

    /// URL to configure as the forward destination.
    pub fn url(&self) -> String {
        format!("{}/", self.server.uri())
    }

    /// Mounts a response for POST `/`.
    pub async fn respond_with(&self, response: MockResponse) {
        let template = match response {
            MockResponse::Accept => ResponseTemplate::new(StatusCode::OK.as_u16()),
            MockResponse::Reject { status } => ResponseTemplate::new(status.as_u16()),
            MockResponse::Slow { delay } => {
                ResponseTemplate::new(StatusCode::OK.as_u16()).set_delay(delay)
            },
        };

        Mock::given(method("POST")).and(path("/")).respond_with(template).mount(&self.server).await;
    }

    /// Mounts an accepting response that only matches the default test
    /// credentials; other credentials get wiremock's 404.
    pub async fn require_test_credentials(&self) {
        Mock::given(method("POST"))
            .and(path("/"))
            .and(header("authorization", TEST_AUTHORIZATION))
            .respond_with(ResponseTemplate::new(StatusCode::OK.as_u16()))
            .mount(&self.server)
            .await;
    }

    /// Every forward received so far, in arrival order.
    pub async fn received_forwards(&self) -> Vec<ReceivedForward> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .map(|request| ReceivedForward {
                method: request.method.to_string(),
                path: request.url.path().to_string(),
                headers: request.headers.clone(),
                body: Bytes::from(request.body),
            })
            .collect()
    }

    /// Asserts that exactly `expected` forwards were received.
    pub async fn assert_forward_count(&self, expected: usize) {
        let received = self.received_forwards().await;
        assert_eq!(
            received.len(),
            expected,
            "Expected {} forwards, received {}",
            expected,
            received.len()
        );
    }
}
