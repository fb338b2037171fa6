//! Envelope unwrapping — locating the record array in an upstream reply.
//!
//! Directory deployments disagree on the top-level shape as much as on
//! field names: some return a bare array, some wrap it under `data` or
//! `patients`, some invent their own wrapper key, and some return a single
//! record object. Unwrapping runs a fixed list of shape detectors in
//! order; only a scalar or null top level is an error.

use serde_json::Value;

use crate::fields::RawRecord;

/// Wrapper keys tried in priority order when the envelope is an object.
const WRAPPER_KEYS: [&str; 4] = ["data", "patients", "results", "records"];

/// The only failure this module produces: a top-level value that is
/// neither an object nor an array.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvelopeError {
    #[error("upstream returned {found} where an object or array was expected")]
    Malformed { found: &'static str },
}

/// JSON type name for error messages.
fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Locate the array of record-like objects in an arbitrary top-level value.
///
/// Detectors, first match wins:
/// 1. bare array — returned verbatim (non-object elements dropped);
/// 2. object with a known wrapper key (`data`, `patients`, `results`,
///    `records`) whose value is an array;
/// 3. object whose first array-of-objects member (insertion order) is used;
/// 4. object with no array member — treated as a single-record result.
///
/// Idempotent on already-unwrapped input: re-wrapping the output as a bare
/// array and unwrapping again yields the same sequence.
pub fn unwrap(envelope: &Value) -> Result<Vec<RawRecord>, EnvelopeError> {
    match envelope {
        Value::Array(items) => Ok(records_of(items)),
        Value::Object(map) => {
            for key in WRAPPER_KEYS {
                if let Some(Value::Array(items)) = map.get(key) {
                    return Ok(records_of(items));
                }
            }
            // Unknown wrapper key — take the first member that looks like
            // a record array.
            for value in map.values() {
                if let Value::Array(items) = value {
                    let records = records_of(items);
                    if !records.is_empty() {
                        return Ok(records);
                    }
                }
            }
            // No array anywhere: the object itself is the single record.
            Ok(vec![map.clone()])
        }
        other => Err(EnvelopeError::Malformed {
            found: type_name(other),
        }),
    }
}

/// Keep only the object elements, cloned out of the envelope.
fn records_of(items: &[Value]) -> Vec<RawRecord> {
    items
        .iter()
        .filter_map(|item| item.as_object().cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_array_passes_through() {
        let records = unwrap(&json!([{"id": "P1"}, {"id": "P2"}])).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["id"], "P1");
    }

    #[test]
    fn non_object_elements_are_dropped() {
        let records = unwrap(&json!([{"id": "P1"}, 42, "noise", null])).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn data_wrapper_unwraps() {
        let records = unwrap(&json!({"data": [{"id": "P1"}]})).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn patients_wrapper_unwraps() {
        let envelope = json!({
            "patients": [{"id": "P001", "name": "John Smith"}],
            "total": 1,
            "page": 1,
        });
        let records = unwrap(&envelope).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["name"], "John Smith");
    }

    #[test]
    fn wrapper_priority_is_fixed() {
        // Both "data" and "patients" present — "data" wins.
        let envelope = json!({
            "patients": [{"id": "from-patients"}],
            "data": [{"id": "from-data"}],
        });
        let records = unwrap(&envelope).unwrap();
        assert_eq!(records[0]["id"], "from-data");
    }

    #[test]
    fn unknown_wrapper_key_falls_back_to_first_record_array() {
        let envelope = json!({"total": 2, "items": [{"id": "P1"}, {"id": "P2"}]});
        let records = unwrap(&envelope).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn object_without_arrays_is_a_single_record() {
        let records = unwrap(&json!({"id": "P1", "name": "Ann"})).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["name"], "Ann");
    }

    #[test]
    fn empty_known_wrapper_is_an_empty_result() {
        let records = unwrap(&json!({"patients": []})).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn null_is_malformed() {
        let err = unwrap(&Value::Null).unwrap_err();
        assert_eq!(err, EnvelopeError::Malformed { found: "null" });
    }

    #[test]
    fn scalar_is_malformed() {
        assert!(unwrap(&json!(42)).is_err());
        assert!(unwrap(&json!("oops")).is_err());
        assert!(unwrap(&json!(true)).is_err());
    }

    #[test]
    fn unwrap_is_idempotent_on_bare_arrays() {
        let first = unwrap(&json!({"data": [{"id": "P1"}, {"id": "P2"}]})).unwrap();
        let rewrapped = Value::Array(first.iter().cloned().map(Value::Object).collect());
        let second = unwrap(&rewrapped).unwrap();
        assert_eq!(first, second);
    }
}
