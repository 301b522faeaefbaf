//! Core domain model for transaction-result relaying.
//!
//! Provides the transaction record schema, the validation rules a record
//! must satisfy before it may leave the process, and the error taxonomy
//! shared by the ingestion and delivery crates.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod models;
pub mod validation;

pub use error::{FieldViolation, RecordError, Result, ValidationErrors, ViolationKind};
pub use models::{Messages, TransactionRecord, ValidatedRecord};
pub use validation::is_numeric;
