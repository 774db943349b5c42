//! Verifiable edit tokens.
//!
//! A token reads `{id}.{issuedAtUnix}.{mac}`, where `mac` is the hex BLAKE3
//! keyed hash of `{id}.{issuedAtUnix}` under the server key. Document ids
//! never contain `.`, so the three parts split unambiguously.

use std::fmt;

use quill_types::DocumentId;
use rand::RngCore;

use crate::error::TokenError;

pub const KEY_LEN: usize = 32;

pub struct EditTokenIssuer {
    key: [u8; KEY_LEN],
}

impl EditTokenIssuer {
    pub fn new(key: [u8; KEY_LEN]) -> Self {
        Self { key }
    }

    /// A key that lives only as long as this process. Tokens stop verifying
    /// after a restart.
    pub fn random() -> Self {
        let mut key = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut key);
        Self { key }
    }

    pub fn from_hex(hex_key: &str) -> Result<Self, TokenError> {
        let bytes = hex::decode(hex_key.trim()).map_err(|e| TokenError::InvalidKey(e.to_string()))?;
        let key: [u8; KEY_LEN] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| TokenError::InvalidKey(format!("got {} bytes", b.len())))?;
        Ok(Self { key })
    }

    pub fn issue(&self, id: &DocumentId) -> String {
        self.issue_at(id, chrono::Utc::now().timestamp())
    }

    pub fn issue_at(&self, id: &DocumentId, issued_at: i64) -> String {
        let claim = format!("{id}.{issued_at}");
        let mac = self.mac(&claim);
        format!("{claim}.{}", mac.to_hex())
    }

    /// The document a token was issued for, if the token is authentic.
    pub fn verify(&self, token: &str) -> Option<DocumentId> {
        let (claim, mac) = token.rsplit_once('.')?;
        let (id, issued_at) = claim.split_once('.')?;
        issued_at.parse::<i64>().ok()?;
        let mac = blake3::Hash::from_hex(mac).ok()?;
        // blake3::Hash equality is constant time.
        if self.mac(claim) != mac {
            return None;
        }
        DocumentId::parse(id).ok()
    }

    fn mac(&self, claim: &str) -> blake3::Hash {
        blake3::keyed_hash(&self.key, claim.as_bytes())
    }
}

impl fmt::Debug for EditTokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditTokenIssuer")
            .field("key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> DocumentId {
        DocumentId::parse(s).unwrap()
    }

    #[test]
    fn issued_token_verifies() {
        let issuer = EditTokenIssuer::random();
        let token = issuer.issue(&id("r1"));
        assert_eq!(issuer.verify(&token), Some(id("r1")));
    }

    #[test]
    fn token_layout() {
        let issuer = EditTokenIssuer::new([7; KEY_LEN]);
        let token = issuer.issue_at(&id("r1"), 1_714_564_800);
        let parts: Vec<_> = token.split('.').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "r1");
        assert_eq!(parts[1], "1714564800");
        assert_eq!(parts[2].len(), 64);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let issuer = EditTokenIssuer::new([7; KEY_LEN]);
        let token = issuer.issue_at(&id("r1"), 100);
        let forged = token.replacen("r1", "r2", 1);
        assert_eq!(issuer.verify(&forged), None);
        let bumped = token.replacen(".100.", ".101.", 1);
        assert_eq!(issuer.verify(&bumped), None);
        assert_eq!(issuer.verify("r1.100"), None);
        assert_eq!(issuer.verify("garbage"), None);
    }

    #[test]
    fn other_keys_do_not_verify() {
        let token = EditTokenIssuer::new([1; KEY_LEN]).issue(&id("r1"));
        assert_eq!(EditTokenIssuer::new([2; KEY_LEN]).verify(&token), None);
    }

    #[test]
    fn hex_key_round_trips() {
        let hex_key = "ab".repeat(KEY_LEN);
        let issuer = EditTokenIssuer::from_hex(&hex_key).unwrap();
        let token = issuer.issue(&id("r1"));
        assert!(EditTokenIssuer::new([0xab; KEY_LEN]).verify(&token).is_some());
    }

    #[test]
    fn rejects_short_or_bad_keys() {
        assert!(EditTokenIssuer::from_hex("abcd").is_err());
        assert!(EditTokenIssuer::from_hex("zz").is_err());
    }

    #[test]
    fn debug_hides_key() {
        let s = format!("{:?}", EditTokenIssuer::new([9; KEY_LEN]));
        assert!(s.contains("redacted"));
        assert!(!s.contains("9, 9"));
    }
}
