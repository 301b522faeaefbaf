//! HTTP request handlers.
//!
//! - `health` - health and liveness probes
//! - `receive` - no-op receiver mounted at `/`

pub mod health;
pub mod receive;

pub use health::{health_check, liveness_check};
pub use receive::receive;
