//! Record builders and stream input helpers.

use serde_json::{json, Map, Value};
use txrelay_core::ValidatedRecord;

/// Builder for transaction record JSON.
///
/// Starts from a valid record; individual fields can be overridden or
/// removed to produce invalid input.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    fields: Map<String, Value>,
}

impl RecordBuilder {
    /// Creates a builder with no fields set.
    pub fn new() -> Self {
        Self { fields: Map::new() }
    }

    /// Creates a builder for a valid record.
    pub fn with_defaults() -> Self {
        Self::new().tx_id("1").tx_type("A").result("OK").result_code("0")
    }

    /// Sets `TxId`.
    #[must_use]
    pub fn tx_id(self, value: impl Into<String>) -> Self {
        self.field("TxId", value.into())
    }

    /// Sets `TxType`.
    #[must_use]
    pub fn tx_type(self, value: impl Into<String>) -> Self {
        self.field("TxType", value.into())
    }

    /// Sets `Result`.
    #[must_use]
    pub fn result(self, value: impl Into<String>) -> Self {
        self.field("Result", value.into())
    }

    /// Sets `Resultcode`.
    #[must_use]
    pub fn result_code(self, value: impl Into<String>) -> Self {
        self.field("Resultcode", value.into())
    }

    /// Sets both optional messages.
    #[must_use]
    pub fn messages(self, response: Option<&str>, error: Option<&str>) -> Self {
        let mut messages = Map::new();
        if let Some(response) = response {
            messages.insert("Response".to_string(), json!(response));
        }
        if let Some(error) = error {
            messages.insert("Error".to_string(), json!(error));
        }
        self.field("Messages", Value::Object(messages))
    }

    /// Sets an arbitrary field to an arbitrary JSON value.
    #[must_use]
    pub fn field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    /// Removes a field entirely.
    #[must_use]
    pub fn without(mut self, name: &str) -> Self {
        self.fields.remove(name);
        self
    }

    /// Builds the record as a JSON value.
    pub fn build_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    /// Builds the record as a single JSON line without a trailing newline.
    pub fn build_line(&self) -> String {
        self.build_value().to_string()
    }

    /// Builds and validates the record.
    ///
    /// # Panics
    ///
    /// Panics if the configured fields do not form a valid record.
    #[allow(clippy::expect_used)]
    pub fn build_validated(&self) -> ValidatedRecord {
        ValidatedRecord::parse(self.build_line().as_bytes())
            .expect("fixture record should be valid")
    }
}

impl Default for RecordBuilder {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Joins lines into newline-terminated stream input.
///
/// ```
/// use txrelay_testing::stream_input;
///
/// assert_eq!(stream_input(["a", "done"]), b"a\ndone\n".to_vec());
/// ```
pub fn stream_input<I, S>(lines: I) -> Vec<u8>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut input = Vec::new();
    for line in lines {
        input.extend_from_slice(line.as_ref().as_bytes());
        input.push(b'\n');
    }
    input
}
