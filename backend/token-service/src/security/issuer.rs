//! Token issuance for all three tiers.
//!
//! Signing is pure: the issuer never touches the key store. Stage handlers
//! decide when a freshly minted verification secret gets published.
use super::{jwt, Clock, OsSecretSource, SecretSource, SigningSecret, SystemClock};
use crate::config::{SigningKeySettings, TokenSettings};
use crate::models::{RealmClaims, SessionClaims, VerificationClaims};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IssueError {
    #[error("failed to sign token: {0}")]
    Signing(#[from] jwt::JwtError),
}

/// A signed verification token together with the secret that signed it.
///
/// The caller publishes `secret` to the key store once it is committed to
/// handing `token` out.
#[derive(Debug)]
pub struct IssuedVerificationToken {
    pub token: String,
    pub secret: SigningSecret,
}

pub struct TokenIssuer {
    session_key: SigningSecret,
    realm_key: SigningSecret,
    session_issuer: String,
    tenant_name: String,
    realm_kid: String,
    ttl_secs: i64,
    clock: Arc<dyn Clock>,
    secrets: Arc<dyn SecretSource>,
}

impl TokenIssuer {
    pub fn new(keys: &SigningKeySettings, tokens: &TokenSettings) -> Self {
        Self {
            session_key: keys.session_key.clone(),
            realm_key: keys.realm_key.clone(),
            session_issuer: tokens.session_issuer.clone(),
            tenant_name: keys.realm_tenant_name.clone(),
            realm_kid: keys.realm_kid(),
            ttl_secs: tokens.ttl_secs,
            clock: Arc::new(SystemClock),
            secrets: Arc::new(OsSecretSource),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_secret_source(mut self, secrets: Arc<dyn SecretSource>) -> Self {
        self.secrets = secrets;
        self
    }

    /// Tier 1: sign `{iss, sub, iat, exp}` with a fresh secret, `kid` = email
    pub fn issue_verification_token(
        &self,
        email: &str,
    ) -> Result<IssuedVerificationToken, IssueError> {
        let now = self.clock.now();
        let claims = VerificationClaims {
            iss: self.session_issuer.clone(),
            sub: email.to_string(),
            iat: now,
            exp: now + self.ttl_secs,
        };

        let secret = self.secrets.generate();
        let token = jwt::sign(&claims, Some(email), &secret)?;
        Ok(IssuedVerificationToken { token, secret })
    }

    /// Tier 2: sign `{iss, sub, nbf, exp}` with the session key, no `kid`
    pub fn issue_session_token(&self, subject: &str) -> Result<String, IssueError> {
        let now = self.clock.now();
        let claims = SessionClaims {
            iss: self.session_issuer.clone(),
            sub: subject.to_string(),
            nbf: now,
            exp: now + self.ttl_secs,
        };
        Ok(jwt::sign(&claims, None, &self.session_key)?)
    }

    /// Tier 3: sign `{iss: tenant, sub, aud: realm, nbf, exp}` with the realm
    /// key, `kid` = `tenant:version`
    pub fn issue_realm_token(&self, subject: &str, realm_id: &str) -> Result<String, IssueError> {
        let now = self.clock.now();
        let claims = RealmClaims {
            iss: self.tenant_name.clone(),
            sub: subject.to_string(),
            aud: realm_id.to_string(),
            nbf: now,
            exp: now + self.ttl_secs,
        };
        Ok(jwt::sign(&claims, Some(&self.realm_kid), &self.realm_key)?)
    }
}
