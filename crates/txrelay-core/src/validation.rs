//! Field constraints for transaction records.
//!
//! Each field is checked against its constraints in order and stops at the
//! first failure, so an empty `TxId` reports `required` rather than both
//! `required` and `numeric`.

use crate::{
    error::{ValidationErrors, ViolationKind},
    models::TransactionRecord,
};

/// Returns true if `value` is a signed decimal number: an optional sign,
/// one or more digits, and an optional fractional part with at least one
/// digit.
///
/// ```
/// use txrelay_core::is_numeric;
///
/// assert!(is_numeric("0042"));
/// assert!(is_numeric("-1.5"));
/// assert!(!is_numeric("1e3"));
/// assert!(!is_numeric("12."));
/// ```
pub fn is_numeric(value: &str) -> bool {
    let unsigned = value.strip_prefix(['+', '-']).unwrap_or(value);

    let (integer, fraction) = match unsigned.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (unsigned, None),
    };

    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

    all_digits(integer) && fraction.is_none_or(all_digits)
}

/// Checks every constrained field of `record`.
pub(crate) fn check(record: &TransactionRecord) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    required_numeric(&mut errors, "TxId", &record.transaction_id);
    required(&mut errors, "TxType", &record.transaction_type);
    required(&mut errors, "Result", &record.result);
    required_numeric(&mut errors, "Resultcode", &record.result_code);

    errors
}

fn required(errors: &mut ValidationErrors, field: &'static str, value: &str) -> bool {
    if value.is_empty() {
        errors.push(field, ViolationKind::Required);
        return false;
    }
    true
}

fn required_numeric(errors: &mut ValidationErrors, field: &'static str, value: &str) {
    if required(errors, field, value) && !is_numeric(value) {
        errors.push(field, ViolationKind::NotNumeric);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Messages;

    fn record(tx_id: &str, tx_type: &str, result: &str, code: &str) -> TransactionRecord {
        TransactionRecord {
            transaction_id: tx_id.to_string(),
            transaction_type: tx_type.to_string(),
            result: result.to_string(),
            result_code: code.to_string(),
            messages: Messages::default(),
        }
    }

    #[test]
    fn numeric_accepts_signed_and_decimal_values() {
        for value in ["0", "123", "+7", "-7", "3.14", "-0.5", "000"] {
            assert!(is_numeric(value), "{value} should be numeric");
        }
    }

    #[test]
    fn numeric_rejects_everything_else() {
        for value in ["", "-", "+", ".5", "5.", "1.2.3", "1e5", " 1", "1 ", "0x1F", "abc", "١٢"] {
            assert!(!is_numeric(value), "{value:?} should not be numeric");
        }
    }

    #[test]
    fn valid_record_has_no_violations() {
        assert!(check(&record("1", "SALE", "OK", "0")).is_empty());
    }

    #[test]
    fn empty_record_reports_every_required_field() {
        let errors = check(&TransactionRecord::default());

        assert_eq!(errors.violations().len(), 4);
        for field in ["TxId", "TxType", "Result", "Resultcode"] {
            assert!(errors.contains(field, ViolationKind::Required), "{field} not reported");
        }
    }

    #[test]
    fn empty_numeric_field_reports_required_only() {
        let errors = check(&record("", "A", "OK", "0"));

        assert!(errors.contains("TxId", ViolationKind::Required));
        assert!(!errors.contains("TxId", ViolationKind::NotNumeric));
    }

    #[test]
    fn non_numeric_identifiers_rejected() {
        let errors = check(&record("abc", "A", "OK", "x1"));

        assert!(errors.contains("TxId", ViolationKind::NotNumeric));
        assert!(errors.contains("Resultcode", ViolationKind::NotNumeric));
        assert_eq!(errors.violations().len(), 2);
    }

    #[test]
    fn whitespace_free_form_fields_count_as_present() {
        assert!(check(&record("1", " ", " ", "0")).is_empty());
    }
}
