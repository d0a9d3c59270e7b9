//! # Payload Hasher
//!
//! Content-addresses a verification payload into a [`ContentDigest`].
//!
//! The digest covers the credential type, the holder and every payload
//! field, serialized through [`CanonicalBytes`]:
//!
//! ```text
//! SHA256(JCS({"fields": {...}, "holder": "0x...", "type": "Identity"}))
//! ```
//!
//! Field order never matters (JCS sorts keys); any change to a field name,
//! a field value, the holder or the type yields a different digest.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::canonical::CanonicalBytes;
use crate::credential_type::CredentialType;
use crate::digest::{sha256_digest, ContentDigest};
use crate::error::HashError;
use crate::identity::WalletAddress;

/// Ordered map of payload field names to values.
pub type FieldMap = BTreeMap<String, Value>;

/// The input to the hasher: what was verified, for whom, with which data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPayload {
    /// The verification flow that produced the payload.
    #[serde(rename = "type")]
    pub credential_type: CredentialType,
    /// The wallet the credential will be bound to.
    pub holder: WalletAddress,
    /// Verified field values.
    pub fields: FieldMap,
}

impl CredentialPayload {
    /// Build a payload from its parts.
    pub fn new(credential_type: CredentialType, holder: WalletAddress, fields: FieldMap) -> Self {
        Self {
            credential_type,
            holder,
            fields,
        }
    }

    /// Check that the payload is non-empty and carries every field its type
    /// requires. A required field that is null or an empty string counts as
    /// missing.
    pub fn validate(&self) -> Result<(), HashError> {
        if self.fields.is_empty() {
            return Err(HashError::EmptyPayload {
                credential_type: self.credential_type,
            });
        }
        for &field in self.credential_type.required_fields() {
            let present = match self.fields.get(field) {
                None | Some(Value::Null) => false,
                Some(Value::String(s)) => !s.trim().is_empty(),
                Some(_) => true,
            };
            if !present {
                return Err(HashError::MissingField {
                    credential_type: self.credential_type,
                    field,
                });
            }
        }
        Ok(())
    }
}

/// Compute the content digest of a payload.
///
/// Deterministic and side-effect free.
///
/// # Errors
///
/// Returns [`HashError`] if the payload is empty, misses a required field,
/// or contains a value the canonicalizer rejects (floats).
pub fn digest(payload: &CredentialPayload) -> Result<ContentDigest, HashError> {
    payload.validate()?;
    let canonical = CanonicalBytes::new(payload)?;
    Ok(sha256_digest(&canonical))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn holder() -> WalletAddress {
        WalletAddress::new("0x742d35cc6634c0532925a3b844bc9e7595f0beb0").unwrap()
    }

    fn identity_fields() -> FieldMap {
        let mut f = FieldMap::new();
        f.insert("fullName".into(), json!("Jane Doe"));
        f.insert("country".into(), json!("Canada"));
        f.insert("docType".into(), json!("Passport"));
        f
    }

    fn identity_payload() -> CredentialPayload {
        CredentialPayload::new(CredentialType::Identity, holder(), identity_fields())
    }

    #[test]
    fn digest_is_deterministic() {
        let p = identity_payload();
        assert_eq!(digest(&p).unwrap(), digest(&p.clone()).unwrap());
    }

    #[test]
    fn canonical_form_binds_type_holder_and_fields() {
        let cb = CanonicalBytes::new(&identity_payload()).unwrap();
        let s = std::str::from_utf8(cb.as_bytes()).unwrap();
        assert_eq!(
            s,
            r#"{"fields":{"country":"Canada","docType":"Passport","fullName":"Jane Doe"},"holder":"0x742d35cc6634c0532925a3b844bc9e7595f0beb0","type":"Identity"}"#
        );
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let mut reversed = FieldMap::new();
        reversed.insert("docType".into(), json!("Passport"));
        reversed.insert("country".into(), json!("Canada"));
        reversed.insert("fullName".into(), json!("Jane Doe"));
        let p2 = CredentialPayload::new(CredentialType::Identity, holder(), reversed);
        assert_eq!(digest(&identity_payload()).unwrap(), digest(&p2).unwrap());
    }

    #[test]
    fn any_field_change_changes_digest() {
        let base = digest(&identity_payload()).unwrap();

        let mut renamed = identity_payload();
        renamed.fields.insert("fullName".into(), json!("Jane Doe "));
        assert_ne!(digest(&renamed).unwrap(), base);

        let mut extra = identity_payload();
        extra.fields.insert("docNumber".into(), json!("X1234567"));
        assert_ne!(digest(&extra).unwrap(), base);

        let mut other_holder = identity_payload();
        other_holder.holder =
            WalletAddress::new("0x8ba1f109551bd432803012645ac136ddd64dba72").unwrap();
        assert_ne!(digest(&other_holder).unwrap(), base);
    }

    #[test]
    fn type_is_part_of_the_digest() {
        let mut fields = FieldMap::new();
        fields.insert("livenessCheck".into(), json!(true));
        fields.insert("ageRange".into(), json!("over-18"));
        fields.insert("method".into(), json!("government-id"));
        let human = CredentialPayload::new(CredentialType::Human, holder(), fields.clone());
        let age = CredentialPayload::new(CredentialType::Age, holder(), fields);
        assert_ne!(digest(&human).unwrap(), digest(&age).unwrap());
    }

    #[test]
    fn missing_required_field_rejected() {
        let mut p = identity_payload();
        p.fields.remove("country");
        match digest(&p).unwrap_err() {
            HashError::MissingField { field, credential_type } => {
                assert_eq!(field, "country");
                assert_eq!(credential_type, CredentialType::Identity);
            }
            other => panic!("expected MissingField, got {other}"),
        }
    }

    #[test]
    fn blank_or_null_required_field_rejected() {
        let mut blank = identity_payload();
        blank.fields.insert("fullName".into(), json!("   "));
        assert!(matches!(digest(&blank), Err(HashError::MissingField { .. })));

        let mut null = identity_payload();
        null.fields.insert("docType".into(), Value::Null);
        assert!(matches!(digest(&null), Err(HashError::MissingField { .. })));
    }

    #[test]
    fn empty_payload_rejected() {
        let p = CredentialPayload::new(CredentialType::Human, holder(), FieldMap::new());
        assert!(matches!(digest(&p), Err(HashError::EmptyPayload { .. })));
    }

    #[test]
    fn float_field_rejected() {
        let mut p = identity_payload();
        p.fields.insert("score".into(), json!(0.97));
        assert!(matches!(digest(&p), Err(HashError::Canonicalization(_))));
    }

    #[test]
    fn no_collisions_across_corpus() {
        let names = ["Jane Doe", "John Doe", "Zoë Ångström", "李小龙", ""];
        let countries = ["Canada", "United States", "Pakistan"];
        let docs = ["Passport", "DriversLicense", "NationalId"];
        let mut seen = std::collections::HashSet::new();
        for name in names {
            for country in countries {
                for doc in docs {
                    let mut f = FieldMap::new();
                    f.insert("fullName".into(), json!(format!("{name}!")));
                    f.insert("country".into(), json!(country));
                    f.insert("docType".into(), json!(doc));
                    let p = CredentialPayload::new(CredentialType::Identity, holder(), f);
                    assert!(seen.insert(digest(&p).unwrap()), "collision for {name}/{country}/{doc}");
                }
            }
        }
        assert_eq!(seen.len(), names.len() * countries.len() * docs.len());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn holder() -> WalletAddress {
        WalletAddress::new("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").unwrap()
    }

    fn age_payload(range: &str, method: &str) -> CredentialPayload {
        let mut f = FieldMap::new();
        f.insert("ageRange".into(), Value::String(range.to_string()));
        f.insert("method".into(), Value::String(method.to_string()));
        CredentialPayload::new(CredentialType::Age, holder(), f)
    }

    proptest! {
        #[test]
        fn digest_deterministic(range in "[a-z0-9-]{1,12}", method in "[a-z-]{1,16}") {
            let p = age_payload(&range, &method);
            prop_assert_eq!(digest(&p).unwrap(), digest(&p).unwrap());
        }

        #[test]
        fn distinct_payloads_distinct_digests(
            a in ("[a-z0-9-]{1,12}", "[a-z-]{1,16}"),
            b in ("[a-z0-9-]{1,12}", "[a-z-]{1,16}"),
        ) {
            prop_assume!(a != b);
            let da = digest(&age_payload(&a.0, &a.1)).unwrap();
            let db = digest(&age_payload(&b.0, &b.1)).unwrap();
            prop_assert_ne!(da, db);
        }
    }
}
