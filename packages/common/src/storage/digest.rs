use std::fmt;

use serde::{Deserialize, Serialize};
use sha1::{Digest as _, Sha1};

use super::error::StorageError;

/// A validated SHA-1 content digest.
///
/// Rendered as 40 lowercase hex characters everywhere it crosses a
/// boundary (storage paths, catalog columns, download URLs).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; 20]);

impl Digest {
    /// Compute the SHA-1 digest of the given data.
    pub fn compute(data: &[u8]) -> Self {
        let hash = Sha1::digest(data);
        Self(hash.into())
    }

    /// Construct from raw digest bytes.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Parse a hex-encoded digest string.
    ///
    /// Anything that is not exactly 40 hex characters is rejected, which
    /// also keeps path separators and dots out of storage paths built from
    /// caller-supplied digests.
    pub fn from_hex(s: &str) -> Result<Self, StorageError> {
        if s.len() != 40 {
            return Err(StorageError::InvalidDigest(format!(
                "expected 40 hex characters, got {}",
                s.len()
            )));
        }

        let bytes = hex::decode(s)
            .map_err(|e| StorageError::InvalidDigest(format!("invalid hex: {e}")))?;

        let arr: [u8; 20] = bytes
            .try_into()
            .map_err(|_| StorageError::InvalidDigest("decoded to wrong length".into()))?;

        Ok(Self(arr))
    }

    /// Return the digest as a 40-character lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Return the raw 20-byte digest.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// First 2 hex characters: the shard directory name.
    pub fn shard_prefix(&self) -> String {
        hex::encode(&self.0[..1])
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Digest {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
