//! Transaction-result record schema.
//!
//! Wire field names follow the upstream producer (`TxId`, `TxType`,
//! `Result`, `Resultcode`, `Messages`). Absent or `null` fields decode to
//! their empty value so that missing data surfaces as a validation failure
//! rather than a decode failure.
//!
//! Key matching is exact-case: `"txid"` is an unknown field, so a record
//! spelled that way fails validation for a missing `TxId`.

use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    error::{RecordError, Result},
    validation,
};

/// A transaction-result record as decoded from input, not yet validated.
///
/// # Example
///
/// ```
/// use txrelay_core::TransactionRecord;
///
/// let record = TransactionRecord::from_slice(
///     br#"{"TxId":"42","TxType":"SALE","Result":"OK","Resultcode":"0"}"#,
/// )
/// .unwrap();
/// assert_eq!(record.transaction_id, "42");
/// assert!(record.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Numeric transaction identifier.
    #[serde(rename = "TxId", default, deserialize_with = "null_as_default")]
    pub transaction_id: String,
    /// Free-form transaction type.
    #[serde(rename = "TxType", default, deserialize_with = "null_as_default")]
    pub transaction_type: String,
    /// Free-form result description.
    #[serde(rename = "Result", default, deserialize_with = "null_as_default")]
    pub result: String,
    /// Numeric result code.
    #[serde(rename = "Resultcode", default, deserialize_with = "null_as_default")]
    pub result_code: String,
    /// Optional response and error messages.
    #[serde(rename = "Messages", default, deserialize_with = "null_as_default")]
    pub messages: Messages,
}

/// Optional messages attached to a record. Never validated.
///
/// Unset messages are omitted when encoding, so a record without them goes
/// out as `"Messages":{}` instead of a pair of empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Messages {
    /// Response text from the processor.
    #[serde(rename = "Response", default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    /// Error text from the processor.
    #[serde(rename = "Error", default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Messages {
    /// Returns true when neither message is set.
    pub fn is_empty(&self) -> bool {
        self.response.is_none() && self.error.is_none()
    }
}

impl TransactionRecord {
    /// Decodes a record from raw JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::Decode` if the bytes are not a JSON object or a
    /// field holds a value of the wrong type.
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).map_err(RecordError::Decode)
    }

    /// Checks every field constraint and promotes the record on success.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::Invalid` listing every violated constraint.
    pub fn validate(self) -> Result<ValidatedRecord> {
        let errors = validation::check(&self);
        if errors.is_empty() {
            Ok(ValidatedRecord(self))
        } else {
            Err(RecordError::Invalid(errors))
        }
    }
}

/// A record that passed validation and may be forwarded.
///
/// Only obtainable through [`TransactionRecord::validate`] or
/// [`ValidatedRecord::parse`], so holding one proves the record is fully
/// valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidatedRecord(TransactionRecord);

impl ValidatedRecord {
    /// Decodes and validates raw input in one step.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::Decode` for malformed input and
    /// `RecordError::Invalid` for constraint violations.
    pub fn parse(data: &[u8]) -> Result<Self> {
        TransactionRecord::from_slice(data)?.validate()
    }

    /// Encodes the record in its canonical wire form.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::Encode` if serialization fails.
    pub fn to_canonical_json(&self) -> Result<Bytes> {
        serde_json::to_vec(&self.0).map(Bytes::from).map_err(RecordError::Encode)
    }

    /// Transaction identifier, for log correlation.
    pub fn tx_id(&self) -> &str {
        &self.0.transaction_id
    }

    /// Borrows the underlying record.
    pub fn record(&self) -> &TransactionRecord {
        &self.0
    }

    /// Unwraps into the underlying record.
    pub fn into_inner(self) -> TransactionRecord {
        self.0
    }
}

impl TryFrom<TransactionRecord> for ValidatedRecord {
    type Error = RecordError;

    fn try_from(record: TransactionRecord) -> Result<Self> {
        record.validate()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
