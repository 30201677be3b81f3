//! Claim sets for the three token tiers.
//!
//! | Tier | Signed by | `kid` header |
//! |------|-----------|--------------|
//! | email verification | per-subject ephemeral secret | the email address |
//! | session | global session key | none |
//! | realm | global realm key | `tenant:keyVersion` |
use serde::{Deserialize, Serialize};

/// Tier 1: proves the bearer received mail at `sub`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationClaims {
    pub iss: String,
    /// Email address
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Tier 2: proves email verification completed for `sub`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub iss: String,
    pub sub: String,
    pub nbf: i64,
    pub exp: i64,
}

/// Tier 3: authorizes `sub` against a single realm
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealmClaims {
    /// Tenant name
    pub iss: String,
    pub sub: String,
    /// Realm identifier
    pub aud: String,
    pub nbf: i64,
    pub exp: i64,
}
