use sha2::{Digest, Sha256};

/// Number of digest bytes rendered by [`fingerprint`].
const FINGERPRINT_BYTES: usize = 6;

/// Compute SHA256 hash of input bytes
pub fn sha256(input: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(input);
    hasher.finalize().into()
}

/// Short, log-safe identifier for key material.
///
/// Renders the first bytes of the SHA-256 digest as lowercase hex so that two
/// keys can be told apart in logs without revealing either of them.
pub fn fingerprint(key: &[u8]) -> String {
    hex::encode(&sha256(key)[..FINGERPRINT_BYTES])
}
