//! Test infrastructure shared by the txrelay crates.
//!
//! Provides record fixtures, an in-memory [`RecordingForwarder`] for
//! exercising the worker pool without a network, and a wiremock-backed
//! [`MockDestination`] that captures what the relay actually sent.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod fixtures;
pub mod forwarder;
pub mod http;

pub use fixtures::{stream_input, RecordBuilder};
pub use forwarder::RecordingForwarder;
pub use http::{MockDestination, MockResponse, ReceivedForward};

/// Credentials every fixture and mock expects unless overridden.
pub const TEST_USERNAME: &str = "username";

/// Password paired with [`TEST_USERNAME`].
pub const TEST_PASSWORD: &str = "password";

/// `Authorization` header value for the default test credentials.
pub const TEST_AUTHORIZATION: &str = "Basic dXNlcm5hbWU6cGFzc3dvcmQ=";
