//! Stable request fingerprints.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// SHA-256 of a request's canonical JSON form, hex encoded.
///
/// Object keys are sorted before hashing, so two requests with the same
/// content share a fingerprint regardless of field order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RequestFingerprint(String);

impl RequestFingerprint {
    /// Fingerprints any serializable request.
    pub fn of<T: Serialize + ?Sized>(request: &T) -> Result<Self, serde_json::Error> {
        // Value's map type is ordered by key, which makes this canonical.
        let canonical = serde_json::to_value(request)?;
        Ok(Self::from_content(&canonical.to_string()))
    }

    pub fn from_content(content: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex digits, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl std::fmt::Display for RequestFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
