//! Property-based tests for record decoding and validation invariants.
//!
//! Records are either fully valid or rejected, and a valid record survives
//! an encode/decode cycle unchanged.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use proptest::{prelude::*, test_runner::Config as ProptestConfig};
use serde_json::json;
use txrelay_core::{is_numeric, Messages, RecordError, TransactionRecord, ValidatedRecord};

/// Deterministic property test configuration for CI stability.
fn proptest_config() -> ProptestConfig {
    ProptestConfig {
        cases: 128,
        fork: false,
        failure_persistence: None,
        source_file: None,
        ..ProptestConfig::default()
    }
}

fn numeric_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[+-]?[0-9]{1,12}(\\.[0-9]{1,6})?").unwrap()
}

fn free_text_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z0-9 _-]{1,32}").unwrap()
}

fn messages_strategy() -> impl Strategy<Value = Messages> {
    (
        prop::option::of(prop::string::string_regex("[A-Za-z0-9 .,:!-]{0,40}").unwrap()),
        prop::option::of(prop::string::string_regex("[A-Za-z0-9 .,:!-]{0,40}").unwrap()),
    )
        .prop_map(|(response, error)| Messages { response, error })
}

/// Generate records that satisfy every constraint.
fn valid_record_strategy() -> impl Strategy<Value = TransactionRecord> {
    (
        numeric_strategy(),
        free_text_strategy(),
        free_text_strategy(),
        numeric_strategy(),
        messages_strategy(),
    )
        .prop_map(|(transaction_id, transaction_type, result, result_code, messages)| {
            TransactionRecord { transaction_id, transaction_type, result, result_code, messages }
        })
}

proptest! {
    #![proptest_config(proptest_config())]

    #[test]
    fn valid_records_always_validate(record in valid_record_strategy()) {
        prop_assert!(record.validate().is_ok());
    }

    #[test]
    fn canonical_encoding_round_trips(record in valid_record_strategy()) {
        let validated = record.clone().validate().unwrap();
        let encoded = validated.to_canonical_json().unwrap();

        let decoded = ValidatedRecord::parse(&encoded).unwrap();
        prop_assert_eq!(decoded.record(), &record);

        // Re-encoding is stable
        prop_assert_eq!(decoded.to_canonical_json().unwrap(), encoded);
    }

    #[test]
    fn non_numeric_transaction_id_rejected(
        record in valid_record_strategy(),
        tx_id in "[A-Za-z][A-Za-z0-9]{0,10}",
    ) {
        let record = TransactionRecord { transaction_id: tx_id, ..record };
        let err = record.validate().unwrap_err();
        prop_assert!(err.is_validation());
    }

    #[test]
    fn non_numeric_result_code_rejected(
        record in valid_record_strategy(),
        code in "[0-9]*[A-Za-z. ][A-Za-z0-9]*",
    ) {
        prop_assume!(!is_numeric(&code));
        let record = TransactionRecord { result_code: code, ..record };
        prop_assert!(record.validate().is_err());
    }

    #[test]
    fn any_missing_required_field_rejects_record(
        record in valid_record_strategy(),
        missing in prop::sample::select(vec!["TxId", "TxType", "Result", "Resultcode"]),
    ) {
        let mut value = serde_json::to_value(&record).unwrap();
        value.as_object_mut().unwrap().remove(missing);

        let err = ValidatedRecord::parse(value.to_string().as_bytes()).unwrap_err();
        prop_assert!(err.violations().iter().any(|v| v.field == missing));
    }

    #[test]
    fn arbitrary_bytes_never_panic(data in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = ValidatedRecord::parse(&data);
    }
}

#[test]
fn minimal_record_validates() {
    let line = json!({"TxId": "1", "TxType": "A", "Result": "OK", "Resultcode": "0"}).to_string();
    let record = ValidatedRecord::parse(line.as_bytes()).expect("example record should be valid");
    assert_eq!(record.tx_id(), "1");
}

#[test]
fn not_json_is_decode_error() {
    let err = ValidatedRecord::parse(b"not json").unwrap_err();
    assert!(matches!(err, RecordError::Decode(_)));
}
