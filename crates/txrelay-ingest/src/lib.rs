//! Record ingestion for txrelay.
//!
//! Two sources feed the same dispatch path: a whole file read once, or a
//! newline-delimited stream read until the `done` sentinel, end of input,
//! or a read error. Every candidate is decoded and validated; only valid
//! records reach the forward queue.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod dispatcher;
pub mod error;
pub mod source;

pub use dispatcher::{DispatchOutcome, DispatchSummary, Dispatcher};
pub use error::{IngestError, Result};
pub use source::{
    classify_line, read_file, spawn_line_reader, Line, LineHandoff, LineReader, Termination,
    SENTINEL,
};
