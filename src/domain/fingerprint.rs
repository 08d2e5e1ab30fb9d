//! Fingerprints: 128-bit digests of a declaration's externally visible shape.

use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

/// Opaque, fixed-size digest. Equal fingerprints mean "unchanged shape".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fingerprint([u8; Fingerprint::DIGEST_LENGTH]);

impl Fingerprint {
    pub const DIGEST_LENGTH: usize = 16;

    pub const ZERO: Fingerprint = Fingerprint([0; Self::DIGEST_LENGTH]);

    pub fn from_bytes(bytes: [u8; Self::DIGEST_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Digest arbitrary content. The leading half of a SHA-256 is kept.
    pub fn from_content(content: impl AsRef<[u8]>) -> Self {
        let digest = Sha256::digest(content.as_ref());
        let mut bytes = [0u8; Self::DIGEST_LENGTH];
        bytes.copy_from_slice(&digest[..Self::DIGEST_LENGTH]);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; Self::DIGEST_LENGTH] {
        &self.0
    }

    /// Lowercase hex, always 32 characters.
    pub fn raw_value(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw_value())
    }
}

impl FromStr for Fingerprint {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.len() != Self::DIGEST_LENGTH * 2 {
            bail!(
                "fingerprint '{}' must have {} hex digits, found {}",
                s,
                Self::DIGEST_LENGTH * 2,
                s.len()
            );
        }
        let mut bytes = [0u8; Self::DIGEST_LENGTH];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| anyhow::anyhow!("fingerprint '{}' is not valid hex: {}", s, e))?;
        Ok(Self(bytes))
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw_value())
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
