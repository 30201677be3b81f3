//! Configuration management for Token Service
//!
//! Loads settings from:
//! 1. AWS Secrets Manager (signing keys, production)
//! 2. Environment variables (development fallback)
//! 3. .env file (local development)
//!
//! # Example
//!
//! ```no_run
//! use token_service::config::Settings;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load().await?;
//!     println!("realm kid: {}", settings.signing_keys.realm_kid());
//!     Ok(())
//! }
//! ```

use anyhow::{Context, Result};
use aws_secrets::{SecretManager, SigningKeysSecret};
use crypto_core::SigningSecret;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// Application settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub tokens: TokenSettings,
    pub signing_keys: SigningKeySettings,
    pub email: EmailSettings,
    pub well_known: WellKnownSettings,
}

impl Settings {
    /// Load settings from AWS Secrets Manager or environment variables
    ///
    /// Priority for signing keys:
    /// 1. AWS Secrets Manager (if AWS_SECRETS_SIGNING_KEYS_NAME is set)
    /// 2. Environment variables (fallback)
    /// 3. .env file (local development)
    pub async fn load() -> Result<Self> {
        // Load .env file in development
        if cfg!(debug_assertions) {
            dotenvy::dotenv().ok();
            info!("Loaded .env file for development");
        }

        let signing_keys = SigningKeySettings::load().await?;

        Ok(Settings {
            server: ServerSettings::from_env()?,
            tokens: TokenSettings::from_env()?,
            signing_keys,
            email: EmailSettings::from_env()?,
            well_known: WellKnownSettings::from_env(),
        })
    }
}

/// Parse `key` from the environment, falling back to `default`
fn env_or<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .with_context(|| format!("Invalid {key}"))
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Upper bound on request bodies, in bytes
    pub body_limit_bytes: usize,
    /// Deadline applied to every request before state is mutated
    pub request_timeout_secs: u64,
}

impl ServerSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_or("SERVER_PORT", "8080")?,
            body_limit_bytes: env_or("REQUEST_BODY_LIMIT_BYTES", "2048")?,
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", "30")?,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Token lifetime and issuer settings
#[derive(Debug, Clone)]
pub struct TokenSettings {
    /// Lifetime of every tier, in seconds
    pub ttl_secs: i64,
    /// `iss` of verification and session tokens
    pub session_issuer: String,
}

impl TokenSettings {
    fn from_env() -> Result<Self> {
        let ttl_secs: i64 = env_or("TOKEN_TTL_SECS", "600")?;
        if ttl_secs <= 0 {
            anyhow::bail!("TOKEN_TTL_SECS must be positive");
        }

        Ok(Self {
            ttl_secs,
            session_issuer: env::var("SESSION_ISSUER").unwrap_or_else(|_| "juicebox".to_string()),
        })
    }
}

/// Process-wide signing keys for the session and realm tiers
///
/// Loaded once at startup; rotating them requires a restart.
#[derive(Debug, Clone)]
pub struct SigningKeySettings {
    pub session_key: SigningSecret,
    pub realm_key: SigningSecret,
    pub realm_key_version: u32,
    pub realm_tenant_name: String,
}

impl SigningKeySettings {
    /// Load signing keys from AWS Secrets Manager or environment variables
    async fn load() -> Result<Self> {
        if let Ok(secret_name) = env::var("AWS_SECRETS_SIGNING_KEYS_NAME") {
            info!(
                secret_name = %secret_name,
                "Loading signing keys from AWS Secrets Manager"
            );

            match Self::from_aws_secrets(&secret_name).await {
                Ok(keys) => {
                    info!(
                        session_key = %keys.session_key.fingerprint(),
                        realm_key = %keys.realm_key.fingerprint(),
                        "Successfully loaded signing keys from AWS Secrets Manager"
                    );
                    return Ok(keys);
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        "Failed to load signing keys from AWS Secrets Manager, falling back to environment variables"
                    );
                }
            }
        }

        info!("Loading signing keys from environment variables (development mode)");
        Self::from_env()
    }

    async fn from_aws_secrets(secret_name: &str) -> Result<Self> {
        let manager = SecretManager::new()
            .await
            .context("Failed to initialize AWS Secrets Manager client")?;

        let secret = manager
            .get_signing_keys(secret_name)
            .await
            .context("Failed to fetch signing keys from AWS Secrets Manager")?;

        Self::from_secret(&secret)
    }

    /// Build from a secret-store document; version and tenant fall back to
    /// the environment when the document omits them.
    fn from_secret(secret: &SigningKeysSecret) -> Result<Self> {
        let realm_key_version = match secret.realm_key_version {
            Some(version) => version,
            None => env_or("REALM_KEY_VERSION", "1")?,
        };
        let realm_tenant_name = match &secret.realm_tenant_name {
            Some(name) => name.clone(),
            None => env::var("REALM_TENANT_NAME").context("REALM_TENANT_NAME must be set")?,
        };

        Ok(Self {
            session_key: SigningSecret::from_hex(&secret.session_signing_key)
                .context("Invalid session_signing_key in secret")?,
            realm_key: SigningSecret::from_hex(&secret.realm_signing_key)
                .context("Invalid realm_signing_key in secret")?,
            realm_key_version,
            realm_tenant_name,
        })
    }

    fn from_env() -> Result<Self> {
        let session_key = env::var("SESSION_SIGNING_KEY").context(
            "SESSION_SIGNING_KEY must be set when AWS_SECRETS_SIGNING_KEYS_NAME is not available",
        )?;
        let realm_key = env::var("REALM_SIGNING_KEY").context(
            "REALM_SIGNING_KEY must be set when AWS_SECRETS_SIGNING_KEYS_NAME is not available",
        )?;

        Ok(Self {
            session_key: SigningSecret::from_hex(&session_key)
                .context("Invalid SESSION_SIGNING_KEY")?,
            realm_key: SigningSecret::from_hex(&realm_key).context("Invalid REALM_SIGNING_KEY")?,
            realm_key_version: env_or("REALM_KEY_VERSION", "1")?,
            realm_tenant_name: env::var("REALM_TENANT_NAME")
                .context("REALM_TENANT_NAME must be set")?,
        })
    }

    /// `kid` header of realm tokens, letting the realm pick among rotated keys
    pub fn realm_kid(&self) -> String {
        format!("{}:{}", self.realm_tenant_name, self.realm_key_version)
    }
}

/// Email service configuration
#[derive(Clone)]
pub struct EmailSettings {
    /// Empty disables delivery (no-op mode)
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub use_starttls: bool,
    /// Domain of the per-message `no-reply-<uuid>@` sender address
    pub sender_domain: String,
    /// Page the magic link points at; the token is appended as `?token=`
    pub link_base_url: String,
}

impl EmailSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            smtp_host: env::var("SMTP_HOST").unwrap_or_default(),
            smtp_port: env_or("SMTP_PORT", "465")?,
            smtp_username: env::var("SMTP_USERNAME").ok(),
            smtp_password: env::var("SMTP_PASSWORD").ok(),
            use_starttls: env::var("SMTP_USE_STARTTLS")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            sender_domain: env::var("SMTP_SENDER_DOMAIN")
                .unwrap_or_else(|_| "juicebox.me".to_string()),
            link_base_url: env::var("EMAIL_LINK_BASE_URL")
                .unwrap_or_else(|_| "https://demo.juicebox.xyz/app".to_string()),
        })
    }
}

impl fmt::Debug for EmailSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailSettings")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &self.smtp_password.as_ref().map(|_| "<redacted>"))
            .field("use_starttls", &self.use_starttls)
            .field("sender_domain", &self.sender_domain)
            .field("link_base_url", &self.link_base_url)
            .finish()
    }
}

/// Deep-link association manifests served under `/.well-known/`
#[derive(Debug, Clone, Default)]
pub struct WellKnownSettings {
    pub apple_app_site_association_path: Option<PathBuf>,
    pub asset_links_path: Option<PathBuf>,
}

impl WellKnownSettings {
    fn from_env() -> Self {
        Self {
            apple_app_site_association_path: env::var_os("APPLE_APP_SITE_ASSOCIATION_PATH")
                .map(PathBuf::from),
            asset_links_path: env::var_os("ANDROID_ASSET_LINKS_PATH").map(PathBuf::from),
        }
    }
}
