//! Tier-specific token verification.
//!
//! The `kid` header is only ever a lookup hint. A tier-1 token is trusted
//! once its signature checks out against the secret stored for that hint and
//! its `sub` names the same address.
use super::{jwt, EphemeralKeyStore, SigningSecret, VerificationSecret};
use crate::config::{SigningKeySettings, TokenSettings};
use crate::models::{SessionClaims, VerificationClaims};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    /// The `kid` names a subject with no store entry
    #[error("no verification entry for subject")]
    UnknownSubject,

    #[error("invalid token: {0}")]
    InvalidToken(String),
}

impl From<jwt::JwtError> for VerifyError {
    fn from(e: jwt::JwtError) -> Self {
        VerifyError::InvalidToken(e.to_string())
    }
}

/// A verified tier-1 token and the secret it was checked against.
///
/// `secret` lets the exchange confirm nobody consumed or replaced the entry
/// between verification and consumption.
#[derive(Debug)]
pub struct VerifiedEmail {
    pub subject: String,
    pub secret: SigningSecret,
    pub claims: VerificationClaims,
}

pub struct TokenVerifier {
    key_store: Arc<EphemeralKeyStore>,
    session_key: SigningSecret,
    session_issuer: String,
}

impl TokenVerifier {
    pub fn new(
        key_store: Arc<EphemeralKeyStore>,
        keys: &SigningKeySettings,
        tokens: &TokenSettings,
    ) -> Self {
        Self {
            key_store,
            session_key: keys.session_key.clone(),
            session_issuer: tokens.session_issuer.clone(),
        }
    }

    /// Verify a tier-1 token against the secret currently stored for its `kid`
    pub fn verify_email_token(&self, token: &str) -> Result<VerifiedEmail, VerifyError> {
        let subject = jwt::decode_kid(token)?
            .ok_or_else(|| VerifyError::InvalidToken("missing kid header".to_string()))?;

        let secret = match self.key_store.lookup(&subject) {
            None => return Err(VerifyError::UnknownSubject),
            Some(VerificationSecret::Consumed) => {
                return Err(VerifyError::InvalidToken(
                    "verification token already used".to_string(),
                ))
            }
            Some(VerificationSecret::Live(secret)) => secret,
        };

        let data = jwt::verify::<VerificationClaims>(token, &secret, &self.validation())?;
        if data.claims.sub != subject {
            return Err(VerifyError::InvalidToken(
                "subject does not match kid".to_string(),
            ));
        }

        Ok(VerifiedEmail {
            subject,
            secret,
            claims: data.claims,
        })
    }

    /// Verify a tier-2 token against the global session key
    pub fn verify_session_token(&self, token: &str) -> Result<SessionClaims, VerifyError> {
        Ok(jwt::verify::<SessionClaims>(token, &self.session_key, &self.validation())?.claims)
    }

    fn validation(&self) -> jsonwebtoken::Validation {
        let mut validation = jwt::strict_validation();
        validation.set_issuer(&[&self.session_issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::{Clock, TokenIssuer};

    struct FixedClock(i64);

    impl Clock for FixedClock {
        fn now(&self) -> i64 {
            self.0
        }
    }

    fn settings() -> (SigningKeySettings, TokenSettings) {
        (
            SigningKeySettings {
                session_key: SigningSecret::from_bytes([1; 32]),
                realm_key: SigningSecret::from_bytes([2; 32]),
                realm_key_version: 1,
                realm_tenant_name: "acme".to_string(),
            },
            TokenSettings {
                ttl_secs: 600,
                session_issuer: "juicebox".to_string(),
            },
        )
    }

    fn setup() -> (Arc<EphemeralKeyStore>, TokenIssuer, TokenVerifier) {
        let (keys, tokens) = settings();
        let store = Arc::new(EphemeralKeyStore::new());
        let issuer = TokenIssuer::new(&keys, &tokens);
        let verifier = TokenVerifier::new(Arc::clone(&store), &keys, &tokens);
        (store, issuer, verifier)
    }

    #[test]
    fn test_verify_email_token() {
        let (store, issuer, verifier) = setup();
        let issued = issuer.issue_verification_token("a@x.com").unwrap();
        store.put("a@x.com", issued.secret.clone());

        let verified = verifier.verify_email_token(&issued.token).unwrap();
        assert_eq!(verified.subject, "a@x.com");
        assert_eq!(verified.secret, issued.secret);
        assert_eq!(verified.claims.iss, "juicebox");
    }

    #[test]
    fn test_unknown_subject_differs_from_consumed() {
        let (store, issuer, verifier) = setup();
        let issued = issuer.issue_verification_token("a@x.com").unwrap();

        // Never published
        assert_eq!(
            verifier.verify_email_token(&issued.token).unwrap_err(),
            VerifyError::UnknownSubject
        );

        store.put("a@x.com", issued.secret.clone());
        store.mark_consumed("a@x.com");
        assert!(matches!(
            verifier.verify_email_token(&issued.token).unwrap_err(),
            VerifyError::InvalidToken(_)
        ));
    }

    #[test]
    fn test_overwritten_secret_invalidates_older_token() {
        let (store, issuer, verifier) = setup();
        let first = issuer.issue_verification_token("a@x.com").unwrap();
        store.put("a@x.com", first.secret.clone());
        let second = issuer.issue_verification_token("a@x.com").unwrap();
        store.put("a@x.com", second.secret.clone());

        assert!(matches!(
            verifier.verify_email_token(&first.token).unwrap_err(),
            VerifyError::InvalidToken(_)
        ));
        assert!(verifier.verify_email_token(&second.token).is_ok());
    }

    #[test]
    fn test_expired_email_token_rejected() {
        let (keys, tokens) = settings();
        let store = Arc::new(EphemeralKeyStore::new());
        let past = chrono::Utc::now().timestamp() - 3600;
        let issuer = TokenIssuer::new(&keys, &tokens).with_clock(Arc::new(FixedClock(past)));
        let verifier = TokenVerifier::new(Arc::clone(&store), &keys, &tokens);

        let issued = issuer.issue_verification_token("a@x.com").unwrap();
        store.put("a@x.com", issued.secret.clone());

        assert!(matches!(
            verifier.verify_email_token(&issued.token).unwrap_err(),
            VerifyError::InvalidToken(_)
        ));
    }

    #[test]
    fn test_kid_must_match_subject() {
        let (store, _, verifier) = setup();
        let secret = SigningSecret::from_bytes([5; 32]);
        store.put("victim@x.com", secret.clone());

        let now = chrono::Utc::now().timestamp();
        let claims = VerificationClaims {
            iss: "juicebox".to_string(),
            sub: "attacker@x.com".to_string(),
            iat: now,
            exp: now + 600,
        };
        let token = jwt::sign(&claims, Some("victim@x.com"), &secret).unwrap();

        assert!(matches!(
            verifier.verify_email_token(&token).unwrap_err(),
            VerifyError::InvalidToken(_)
        ));
    }

    #[test]
    fn test_missing_kid_rejected() {
        let (_, issuer, verifier) = setup();
        let session = issuer.issue_session_token("a@x.com").unwrap();
        assert!(matches!(
            verifier.verify_email_token(&session).unwrap_err(),
            VerifyError::InvalidToken(_)
        ));
        assert!(matches!(
            verifier.verify_email_token("garbage").unwrap_err(),
            VerifyError::InvalidToken(_)
        ));
    }

    #[test]
    fn test_verify_session_token() {
        let (store, issuer, verifier) = setup();
        let session = issuer.issue_session_token("a@x.com").unwrap();
        let claims = verifier.verify_session_token(&session).unwrap();
        assert_eq!(claims.sub, "a@x.com");

        // A tier-1 token never passes as a session token
        let issued = issuer.issue_verification_token("a@x.com").unwrap();
        store.put("a@x.com", issued.secret);
        assert!(verifier.verify_session_token(&issued.token).is_err());
    }

    #[test]
    fn test_session_token_wrong_issuer_rejected() {
        let (keys, _) = settings();
        let (_, _, verifier) = setup();
        let other = TokenIssuer::new(
            &keys,
            &TokenSettings {
                ttl_secs: 600,
                session_issuer: "someone-else".to_string(),
            },
        );
        let token = other.issue_session_token("a@x.com").unwrap();
        assert!(verifier.verify_session_token(&token).is_err());
    }

    #[test]
    fn test_expired_session_token_rejected() {
        let (keys, tokens) = settings();
        let (_, _, verifier) = setup();
        let past = chrono::Utc::now().timestamp() - 3600;
        let issuer = TokenIssuer::new(&keys, &tokens).with_clock(Arc::new(FixedClock(past)));
        let token = issuer.issue_session_token("a@x.com").unwrap();
        assert!(verifier.verify_session_token(&token).is_err());
    }
}
