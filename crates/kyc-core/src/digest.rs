//! # Content Digest: Fixed-Width Content Addresses
//!
//! Defines [`ContentDigest`], the 32-byte SHA-256 output that identifies a
//! credential payload, and the hex helpers shared by the commitment store
//! and the chain layer.
//!
//! ## Security Invariant
//!
//! [`sha256_digest()`] only accepts [`CanonicalBytes`], so every content
//! digest in the system was produced through JCS canonicalization.
//! [`sha256_raw()`] exists for domain-separated tree hashing, where the
//! input is already a fixed-width binary encoding.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;
use crate::error::ValidationError;

/// A 32-byte SHA-256 content digest.
///
/// Renders as `0x` followed by 64 lowercase hex digits, the format the
/// dashboard shows for credential hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    /// Wrap raw digest bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse a digest from 64 hex digits, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, ValidationError> {
        decode_hex_32(s).map(Self)
    }

    /// Access the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render the digest as 64 lowercase hex digits (no prefix).
    pub fn to_hex(&self) -> String {
        encode_hex(&self.0)
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl Serialize for ContentDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ContentDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Compute a SHA-256 content digest from canonical bytes.
pub fn sha256_digest(data: &CanonicalBytes) -> ContentDigest {
    ContentDigest(sha256_raw(data.as_bytes()))
}

/// Compute a SHA-256 hex string from canonical bytes.
pub fn sha256_hex(data: &CanonicalBytes) -> String {
    sha256_digest(data).to_hex()
}

/// SHA-256 over raw bytes, returning the 32-byte output.
pub fn sha256_raw(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Encode bytes as lowercase hex.
pub fn encode_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Decode exactly 32 bytes from 64 hex digits, accepting an optional `0x`.
pub fn decode_hex_32(s: &str) -> Result<[u8; 32], ValidationError> {
    let trimmed = s.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if body.len() != 64 {
        return Err(ValidationError::InvalidHex {
            value: s.to_string(),
            reason: format!("expected 64 hex digits, got {}", body.len()),
        });
    }
    if !body.is_ascii() {
        return Err(ValidationError::InvalidHex {
            value: s.to_string(),
            reason: "contains non-ASCII characters".into(),
        });
    }
    let mut out = [0u8; 32];
    for (i, slot) in out.iter_mut().enumerate() {
        let pair = &body[i * 2..i * 2 + 2];
        *slot = u8::from_str_radix(pair, 16).map_err(|e| ValidationError::InvalidHex {
            value: s.to_string(),
            reason: format!("invalid hex at position {}: {e}", i * 2),
        })?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_digest_deterministic() {
        let cb = CanonicalBytes::new(&serde_json::json!({"a": 1, "b": 2})).unwrap();
        assert_eq!(sha256_digest(&cb), sha256_digest(&cb));
    }

    #[test]
    fn known_sha256_vector() {
        // SHA256("{}")
        let cb = CanonicalBytes::new(&serde_json::json!({})).unwrap();
        assert_eq!(
            sha256_hex(&cb),
            "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );
    }

    #[test]
    fn display_has_0x_prefix() {
        let d = ContentDigest::from_bytes([0xab; 32]);
        let s = d.to_string();
        assert!(s.starts_with("0x"));
        assert_eq!(s.len(), 66);
    }

    #[test]
    fn from_hex_accepts_prefixed_and_bare() {
        let d = ContentDigest::from_bytes([0x1f; 32]);
        assert_eq!(ContentDigest::from_hex(&d.to_string()).unwrap(), d);
        assert_eq!(ContentDigest::from_hex(&d.to_hex()).unwrap(), d);
        assert_eq!(
            ContentDigest::from_hex(&d.to_hex().to_uppercase()).unwrap(),
            d
        );
    }

    #[test]
    fn from_hex_rejects_bad_input() {
        assert!(ContentDigest::from_hex("0x1234").is_err());
        assert!(ContentDigest::from_hex(&"zz".repeat(32)).is_err());
        assert!(ContentDigest::from_hex("").is_err());
    }

    #[test]
    fn serde_uses_prefixed_hex() {
        let d = ContentDigest::from_bytes([0x02; 32]);
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "02".repeat(32)));
        let back: ContentDigest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }
}
