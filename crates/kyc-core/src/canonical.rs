//! # Canonical Serialization: JCS-Compatible Byte Production
//!
//! Defines `CanonicalBytes`, the sole construction path for bytes used in
//! digest computation across the pipeline.
//!
//! `CanonicalBytes::new()` rejects floats, then writes RFC 8785 JSON
//! (sorted keys, no whitespace). Field maps holding the same entries yield
//! the same bytes whatever order they were built in.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by JCS canonicalization.
///
/// # Invariants
///
/// - The only constructor is `CanonicalBytes::new()`.
/// - All numbers are integers, never floats.
/// - Serialization uses sorted keys with compact separators (RFC 8785).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Canonicalize any serializable value. Floats anywhere in the tree are
    /// `FloatRejected`.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        reject_floats(&value)?;
        let bytes = serialize_canonical(&value)?;
        Ok(Self(bytes))
    }

    /// Access the canonical bytes for digest computation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Fails on the first non-integer number, depth first.
fn reject_floats(value: &Value) -> Result<(), CanonicalizationError> {
    match value {
        Value::Null | Value::Bool(_) | Value::String(_) => Ok(()),
        Value::Number(n) => {
            if n.is_f64() && !n.is_i64() && !n.is_u64() {
                if let Some(f) = n.as_f64() {
                    return Err(CanonicalizationError::FloatRejected(f));
                }
            }
            Ok(())
        }
        Value::Object(map) => map.values().try_for_each(reject_floats),
        Value::Array(arr) => arr.iter().try_for_each(reject_floats),
    }
}

/// Serialize a JSON value in JCS-canonical form (RFC 8785).
fn serialize_canonical(value: &Value) -> Result<Vec<u8>, CanonicalizationError> {
    let s = serde_jcs::to_string(value)?;
    Ok(s.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorted_keys_compact_separators() {
        let data = serde_json::json!({"fullName": "Jane Doe", "country": "Canada", "docType": "Passport"});
        let cb = CanonicalBytes::new(&data).unwrap();
        let s = std::str::from_utf8(cb.as_bytes()).unwrap();
        assert_eq!(
            s,
            r#"{"country":"Canada","docType":"Passport","fullName":"Jane Doe"}"#
        );
    }

    #[test]
    fn nested_objects_sorted() {
        let data = serde_json::json!({
            "outer": {"b": 2, "a": 1},
            "list": [3, 2, 1]
        });
        let cb = CanonicalBytes::new(&data).unwrap();
        let s = std::str::from_utf8(cb.as_bytes()).unwrap();
        assert_eq!(s, r#"{"list":[3,2,1],"outer":{"a":1,"b":2}}"#);
    }

    #[test]
    fn float_rejected() {
        let data = serde_json::json!({"score": 1.5});
        match CanonicalBytes::new(&data).unwrap_err() {
            CanonicalizationError::FloatRejected(f) => assert_eq!(f, 1.5),
            other => panic!("expected FloatRejected, got: {other}"),
        }
    }

    #[test]
    fn deeply_nested_float_rejected() {
        let data = serde_json::json!({"a": {"b": [{"c": 3.25}]}});
        assert!(CanonicalBytes::new(&data).is_err());
    }

    #[test]
    fn integers_bools_and_null_pass_through() {
        let data = serde_json::json!({"n": -42, "flag": true, "none": null});
        let cb = CanonicalBytes::new(&data).unwrap();
        let s = std::str::from_utf8(cb.as_bytes()).unwrap();
        assert_eq!(s, r#"{"flag":true,"n":-42,"none":null}"#);
    }

    #[test]
    fn empty_object() {
        let cb = CanonicalBytes::new(&serde_json::json!({})).unwrap();
        assert_eq!(cb.as_bytes(), b"{}");
        assert!(!cb.is_empty());
        assert_eq!(cb.len(), 2);
    }

    #[test]
    fn unicode_passes_through_as_utf8() {
        let data = serde_json::json!({"name": "Zoë Ångström"});
        let cb = CanonicalBytes::new(&data).unwrap();
        let s = std::str::from_utf8(cb.as_bytes()).unwrap();
        assert!(s.contains("Zoë Ångström"));
    }
}
