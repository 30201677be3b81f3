/// Security module: the token lifecycle core
///
/// Provides the three-tier token machinery:
/// - Ephemeral key store (per-email verification secrets)
/// - Token issuance for the verification, session and realm tiers
/// - Token verification with tier-specific key resolution
///
/// ## Architecture
///
/// - **crypto-core::jwt**: Shared HS256 implementation
/// - **key_store**: the only mutable shared state, behind a single lock
/// - **issuer**: pure signing given claims and a key
/// - **verifier**: picks the key from the `kid` hint and validates
// Re-export JWT functionality from shared crypto-core library
pub use crypto_core::jwt;
pub use crypto_core::SigningSecret;

pub mod issuer;
pub mod key_store;
pub mod verifier;

pub use issuer::{IssueError, IssuedVerificationToken, TokenIssuer};
pub use key_store::{EphemeralKeyStore, VerificationSecret};
pub use verifier::{TokenVerifier, VerifiedEmail, VerifyError};

/// Source of "now" for claim timestamps, in Unix seconds
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Source of fresh per-subject verification secrets
pub trait SecretSource: Send + Sync {
    fn generate(&self) -> SigningSecret;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct OsSecretSource;

impl SecretSource for OsSecretSource {
    fn generate(&self) -> SigningSecret {
        SigningSecret::generate()
    }
}
