use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Number of random bytes behind a remember token (22 base64 characters).
const REMEMBER_TOKEN_BYTES: usize = 16;

/// Hash used to store remember tokens.
///
/// SHA-1 is the stored format of existing `remember_token` columns and stays
/// the default. It is a weak primitive; new deployments can opt into SHA-256
/// through `REMEMBER_TOKEN_DIGEST=sha256`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenDigest {
    #[default]
    Sha1,
    Sha256,
}

impl TokenDigest {
    /// Lower-case hex digest of `token`. Deterministic for a given algorithm.
    pub fn digest(&self, token: impl AsRef<[u8]>) -> String {
        match self {
            TokenDigest::Sha1 => hex::encode(Sha1::digest(token.as_ref())),
            TokenDigest::Sha256 => hex::encode(Sha256::digest(token.as_ref())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenDigest::Sha1 => "sha1",
            TokenDigest::Sha256 => "sha256",
        }
    }
}

impl fmt::Display for TokenDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown token digest '{0}' (expected sha1 or sha256)")]
pub struct UnknownDigest(pub String);

impl FromStr for TokenDigest {
    type Err = UnknownDigest;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha1" | "sha-1" => Ok(TokenDigest::Sha1),
            "sha256" | "sha-256" => Ok(TokenDigest::Sha256),
            other => Err(UnknownDigest(other.to_string())),
        }
    }
}

/// Fresh URL-safe random token, unrelated to any user input.
pub fn new_remember_token() -> String {
    let mut bytes = [0u8; REMEMBER_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Digest with the default algorithm.
pub fn digest(token: impl AsRef<[u8]>) -> String {
    TokenDigest::default().digest(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_remember_token_is_url_safe() {
        let token = new_remember_token();
        assert_eq!(token.len(), 22);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_new_remember_token_is_not_repeated() {
        assert_ne!(new_remember_token(), new_remember_token());
    }

    #[test]
    fn test_sha1_digest_known_value() {
        assert_eq!(digest("abc"), "a9993e364706816aba3e25717850c26c9cd0d89d");
    }

    #[test]
    fn test_sha256_digest_known_value() {
        assert_eq!(
            TokenDigest::Sha256.digest("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_digest_is_deterministic() {
        let token = new_remember_token();
        assert_eq!(digest(&token), digest(&token));
        assert_ne!(digest(&token), digest(format!("{}x", token)));
    }

    #[test]
    fn test_parse_digest_name() {
        assert_eq!("SHA256".parse::<TokenDigest>().ok(), Some(TokenDigest::Sha256));
        assert_eq!("sha-1".parse::<TokenDigest>().ok(), Some(TokenDigest::Sha1));
        assert!("md5".parse::<TokenDigest>().is_err());
    }
}
