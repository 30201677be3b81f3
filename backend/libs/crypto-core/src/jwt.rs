/// Shared HS256 JWT module for the token service
///
/// Every token tier (email verification, session, realm) is a compact JWS signed
/// with HMAC-SHA256. The tiers differ only in which secret signs them and which
/// claims they carry, so this module owns the parts they have in common.
///
/// ## Security Design
///
/// - **HS256 ONLY**: validation pins the algorithm, so `none`, asymmetric and
///   other HMAC variants are rejected before a signature is checked
/// - **Fixed-size secrets**: all key material is exactly 32 bytes
/// - **No hardcoded keys**: secrets are generated at runtime or supplied by
///   configuration
/// - **No leeway**: tokens are minted and checked by the same process
///
/// ## Usage
///
/// ```rust
/// use crypto_core::jwt::{self, SigningSecret};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Claims {
///     sub: String,
///     exp: u64,
/// }
///
/// let secret = SigningSecret::generate();
/// let claims = Claims {
///     sub: "a@x.com".into(),
///     exp: jsonwebtoken::get_current_timestamp() + 600,
/// };
/// let token = jwt::sign(&claims, Some("a@x.com"), &secret).unwrap();
///
/// assert_eq!(jwt::decode_kid(&token).unwrap().as_deref(), Some("a@x.com"));
/// let data = jwt::verify::<Claims>(&token, &secret, &jwt::strict_validation()).unwrap();
/// assert_eq!(data.claims.sub, "a@x.com");
/// ```
use jsonwebtoken::{
    decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, TokenData,
    Validation,
};
use rand::{rngs::OsRng, RngCore};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub use jsonwebtoken::errors::{Error as JwtError, ErrorKind as JwtErrorKind};

// ============================================================================
// Constants
// ============================================================================

/// Length in bytes of every signing secret (256 bits)
pub const SECRET_LEN: usize = 32;

/// JWT algorithm - the only one accepted anywhere in the service
pub const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

// ============================================================================
// Key Material
// ============================================================================

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("signing secret must be {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("signing secret is not valid hex: {0}")]
    InvalidHex(String),
}

/// A 32-byte HMAC secret.
///
/// The bytes are wiped on drop and never appear in `Debug` output; only a
/// short SHA-256 fingerprint is printed.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SigningSecret([u8; SECRET_LEN]);

impl SigningSecret {
    /// Draw a fresh secret from the operating system RNG
    pub fn generate() -> Self {
        let mut bytes = [0u8; SECRET_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; SECRET_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        let array: [u8; SECRET_LEN] =
            bytes.try_into().map_err(|_| KeyError::InvalidLength {
                expected: SECRET_LEN,
                actual: bytes.len(),
            })?;
        Ok(Self(array))
    }

    /// Parse a hex-encoded secret (surrounding whitespace is ignored)
    pub fn from_hex(encoded: &str) -> Result<Self, KeyError> {
        let mut bytes =
            hex::decode(encoded.trim()).map_err(|e| KeyError::InvalidHex(e.to_string()))?;
        let secret = Self::from_slice(&bytes);
        bytes.zeroize();
        secret
    }

    /// Log-safe identifier for this secret
    pub fn fingerprint(&self) -> String {
        crate::hash::fingerprint(&self.0)
    }

    fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(&self.0)
    }

    fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(&self.0)
    }
}

impl PartialEq for SigningSecret {
    fn eq(&self, other: &Self) -> bool {
        // Constant time over the full length.
        self.0
            .iter()
            .zip(other.0.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl Eq for SigningSecret {}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SigningSecret")
            .field(&self.fingerprint())
            .finish()
    }
}

// ============================================================================
// Token Generation
// ============================================================================

/// Sign `claims` with HS256, optionally setting the `kid` header
pub fn sign<C: Serialize>(
    claims: &C,
    kid: Option<&str>,
    secret: &SigningSecret,
) -> Result<String, JwtError> {
    let mut header = Header::new(JWT_ALGORITHM);
    header.kid = kid.map(str::to_owned);
    encode(&header, claims, &secret.encoding_key())
}

// ============================================================================
// Token Validation
// ============================================================================

/// Baseline validation shared by every tier.
///
/// Pins HS256, requires `exp`, checks `exp` and `nbf` with zero leeway.
/// Callers add issuer or audience requirements on top.
pub fn strict_validation() -> Validation {
    let mut validation = Validation::new(JWT_ALGORITHM);
    validation.leeway = 0;
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation
}

/// Verify signature and registered claims, returning the decoded token
pub fn verify<C: DeserializeOwned>(
    token: &str,
    secret: &SigningSecret,
    validation: &Validation,
) -> Result<TokenData<C>, JwtError> {
    decode::<C>(token, &secret.decoding_key(), validation)
}

/// Read the `kid` header without verifying anything.
///
/// The result is only a hint for picking the verification key; it must never
/// be trusted on its own.
pub fn decode_kid(token: &str) -> Result<Option<String>, JwtError> {
    Ok(decode_header(token)?.kid)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::get_current_timestamp;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize)]
    struct TestClaims {
        sub: String,
        exp: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        nbf: Option<u64>,
    }

    fn claims_expiring_in(secs: i64) -> TestClaims {
        TestClaims {
            sub: "a@x.com".to_string(),
            exp: (get_current_timestamp() as i64 + secs) as u64,
            nbf: None,
        }
    }

    #[test]
    fn test_sign_and_verify() {
        let secret = SigningSecret::generate();
        let token = sign(&claims_expiring_in(600), Some("a@x.com"), &secret).unwrap();

        assert_eq!(token.matches('.').count(), 2);
        assert_eq!(decode_kid(&token).unwrap().as_deref(), Some("a@x.com"));

        let data = verify::<TestClaims>(&token, &secret, &strict_validation()).unwrap();
        assert_eq!(data.claims.sub, "a@x.com");
        assert_eq!(data.header.alg, Algorithm::HS256);
    }

    #[test]
    fn test_missing_kid_is_none() {
        let secret = SigningSecret::generate();
        let token = sign(&claims_expiring_in(600), None, &secret).unwrap();
        assert_eq!(decode_kid(&token).unwrap(), None);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = sign(&claims_expiring_in(600), None, &SigningSecret::generate()).unwrap();
        let err = verify::<TestClaims>(&token, &SigningSecret::generate(), &strict_validation())
            .unwrap_err();
        assert_eq!(err.kind(), &JwtErrorKind::InvalidSignature);
    }

    #[test]
    fn test_expired_token_rejected() {
        let secret = SigningSecret::generate();
        let token = sign(&claims_expiring_in(-1), None, &secret).unwrap();
        let err = verify::<TestClaims>(&token, &secret, &strict_validation()).unwrap_err();
        assert_eq!(err.kind(), &JwtErrorKind::ExpiredSignature);
    }

    #[test]
    fn test_future_nbf_rejected() {
        let secret = SigningSecret::generate();
        let mut claims = claims_expiring_in(600);
        claims.nbf = Some(get_current_timestamp() + 300);
        let token = sign(&claims, None, &secret).unwrap();
        let err = verify::<TestClaims>(&token, &secret, &strict_validation()).unwrap_err();
        assert_eq!(err.kind(), &JwtErrorKind::ImmatureSignature);
    }

    #[test]
    fn test_alg_none_rejected() {
        // {"alg":"none","typ":"JWT","kid":"a@x.com"} . {"sub":"a@x.com","exp":9999999999} .
        let token = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIiwia2lkIjoiYUB4LmNvbSJ9.\
                     eyJzdWIiOiJhQHguY29tIiwiZXhwIjo5OTk5OTk5OTk5fQ.";
        assert!(decode_kid(token).is_err());
        assert!(
            verify::<TestClaims>(token, &SigningSecret::generate(), &strict_validation()).is_err()
        );
    }

    #[test]
    fn test_other_hmac_algorithm_rejected() {
        let secret = SigningSecret::generate();
        let token = encode(
            &Header::new(Algorithm::HS384),
            &claims_expiring_in(600),
            &secret.encoding_key(),
        )
        .unwrap();
        let err = verify::<TestClaims>(&token, &secret, &strict_validation()).unwrap_err();
        assert_eq!(err.kind(), &JwtErrorKind::InvalidAlgorithm);
    }

    #[test]
    fn test_from_hex() {
        let hex_key = "50".repeat(SECRET_LEN);
        let secret = SigningSecret::from_hex(&format!(" {hex_key}\n")).unwrap();
        assert_eq!(secret, SigningSecret::from_bytes([0x50; SECRET_LEN]));

        assert_eq!(
            SigningSecret::from_hex("abcd").unwrap_err(),
            KeyError::InvalidLength {
                expected: SECRET_LEN,
                actual: 2
            }
        );
        assert!(matches!(
            SigningSecret::from_hex("zz"),
            Err(KeyError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_generated_secrets_differ() {
        assert_ne!(SigningSecret::generate(), SigningSecret::generate());
    }

    #[test]
    fn test_debug_does_not_leak_bytes() {
        let secret = SigningSecret::from_bytes([0xab; SECRET_LEN]);
        let rendered = format!("{secret:?}");
        assert!(rendered.starts_with("SigningSecret("));
        assert!(!rendered.contains(&"ab".repeat(8)));
    }
}
