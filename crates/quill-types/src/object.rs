use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Content-addressed identifier for a blob, tree, or commit.
///
/// Stored as lowercase hex. Two digest widths are accepted: 40 chars (SHA-1,
/// as returned by the GitHub Git Data API) and 64 chars (BLAKE3, as computed
/// by the in-memory store). Identical content always maps to the same id
/// within one backend.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(String);

impl ObjectId {
    /// Create an `ObjectId` from a pre-computed 32-byte digest.
    pub fn from_digest(digest: [u8; 32]) -> Self {
        Self(hex::encode(digest))
    }

    /// Parse from a hex string, normalizing to lowercase.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        if s.len() != 40 && s.len() != 64 {
            return Err(TypeError::InvalidLength(s.len()));
        }
        hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        Ok(Self(s.to_ascii_lowercase()))
    }

    /// Hex-encoded string representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> &str {
        &self.0[..8]
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.short_hex())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ObjectId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHA1: &str = "95b966ae1c166bd92f8ae7d1c313e738c731dfc3";

    #[test]
    fn accepts_sha1_width() {
        let id = ObjectId::from_hex(SHA1).unwrap();
        assert_eq!(id.as_str(), SHA1);
    }

    #[test]
    fn accepts_blake3_width() {
        let id = ObjectId::from_digest([7u8; 32]);
        assert_eq!(id.as_str().len(), 64);
        assert_eq!(ObjectId::from_hex(id.as_str()).unwrap(), id);
    }

    #[test]
    fn normalizes_to_lowercase() {
        let id = ObjectId::from_hex(&SHA1.to_uppercase()).unwrap();
        assert_eq!(id.as_str(), SHA1);
    }

    #[test]
    fn rejects_bad_length() {
        assert_eq!(
            ObjectId::from_hex("abcd").unwrap_err(),
            TypeError::InvalidLength(4)
        );
    }

    #[test]
    fn rejects_non_hex() {
        let bad = "z".repeat(40);
        assert!(matches!(
            ObjectId::from_hex(&bad),
            Err(TypeError::InvalidHex(_))
        ));
    }

    #[test]
    fn short_hex_is_8_chars() {
        let id = ObjectId::from_digest([0xab; 32]);
        assert_eq!(id.short_hex(), "abababab");
    }

    #[test]
    fn serde_validates_on_deserialize() {
        let json = format!("\"{SHA1}\"");
        let id: ObjectId = serde_json::from_str(&json).unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), json);
        assert!(serde_json::from_str::<ObjectId>("\"nope\"").is_err());
    }
}
