//! AWS Secrets Manager integration library
//!
//! This library provides a high-level interface to AWS Secrets Manager with:
//! - Graceful error handling
//! - Integration with Kubernetes IRSA (IAM Roles for Service Accounts)
//!
//! # Example
//!
//! ```no_run
//! use aws_secrets::SecretManager;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create manager (uses AWS credentials from environment/IRSA)
//!     let manager = SecretManager::new().await?;
//!
//!     // Fetch the session and realm signing keys
//!     let keys = manager.get_signing_keys("prod/token-service/signing-keys").await?;
//!     println!("realm key version: {:?}", keys.realm_key_version);
//!
//!     Ok(())
//! }
//! ```

use anyhow::Result;
use aws_config::BehaviorVersion;
use aws_sdk_secretsmanager::Client as SecretsClient;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum SecretError {
    #[error("Secret not found: {0}")]
    NotFound(String),

    #[error("Access denied to secret: {0}")]
    AccessDenied(String),

    #[error("Secret decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Invalid secret format: {0}")]
    InvalidFormat(String),

    #[error("AWS SDK error: {0}")]
    AwsSdk(String),
}

/// Signing key document stored in AWS Secrets Manager
///
/// Keys are hex-encoded 32-byte HMAC secrets. Length is checked by the
/// consumer, which owns the key type.
#[derive(Clone, Serialize, Deserialize)]
pub struct SigningKeysSecret {
    pub session_signing_key: String,
    pub realm_signing_key: String,
    #[serde(default)]
    pub realm_key_version: Option<u32>,
    #[serde(default)]
    pub realm_tenant_name: Option<String>,
}

impl SigningKeysSecret {
    /// Parse signing keys from JSON string
    pub fn from_json(json: &str) -> Result<Self, SecretError> {
        serde_json::from_str(json).map_err(|e| {
            SecretError::InvalidFormat(format!("Failed to parse signing keys: {}", e))
        })
    }
}

impl fmt::Debug for SigningKeysSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKeysSecret")
            .field("session_signing_key", &"<redacted>")
            .field("realm_signing_key", &"<redacted>")
            .field("realm_key_version", &self.realm_key_version)
            .field("realm_tenant_name", &self.realm_tenant_name)
            .finish()
    }
}

/// AWS Secrets Manager client
///
/// Signing keys are read once at startup, so every call goes to AWS.
pub struct SecretManager {
    client: SecretsClient,
}

impl SecretManager {
    /// Create a new SecretManager with default AWS configuration
    ///
    /// Uses AWS credentials from:
    /// 1. Environment variables (AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY)
    /// 2. AWS credentials file (~/.aws/credentials)
    /// 3. IAM instance profile (EC2)
    /// 4. IAM Roles for Service Accounts (EKS/Kubernetes)
    pub async fn new() -> Result<Self> {
        let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        info!("Initialized AWS Secrets Manager client");
        Ok(Self::from_client(SecretsClient::new(&config)))
    }

    /// Wrap an already configured client
    pub fn from_client(client: SecretsClient) -> Self {
        Self { client }
    }

    /// Get a secret string by name
    pub async fn get_secret(&self, secret_name: &str) -> Result<String, SecretError> {
        debug!(secret_name = %secret_name, "Fetching secret from AWS Secrets Manager");

        let response = self
            .client
            .get_secret_value()
            .secret_id(secret_name)
            .send()
            .await
            .map_err(|e| classify_sdk_error(secret_name, e.to_string()))?;

        let secret_string = response
            .secret_string()
            .ok_or_else(|| SecretError::InvalidFormat("Secret is binary, not string".to_string()))?
            .to_string();

        info!(
            secret_name = %secret_name,
            version_id = ?response.version_id(),
            "Secret fetched from AWS Secrets Manager"
        );

        Ok(secret_string)
    }

    /// Get session and realm signing keys from AWS Secrets Manager
    ///
    /// Expects the secret to be stored as JSON with the following structure:
    /// ```json
    /// {
    ///   "session_signing_key": "64 hex chars",
    ///   "realm_signing_key": "64 hex chars",
    ///   "realm_key_version": 1,
    ///   "realm_tenant_name": "juiceboxdemo"
    /// }
    /// ```
    pub async fn get_signing_keys(
        &self,
        secret_name: &str,
    ) -> Result<SigningKeysSecret, SecretError> {
        let secret_json = self.get_secret(secret_name).await?;
        SigningKeysSecret::from_json(&secret_json)
    }
}

fn classify_sdk_error(secret_name: &str, error_msg: String) -> SecretError {
    if error_msg.contains("ResourceNotFoundException") {
        SecretError::NotFound(secret_name.to_string())
    } else if error_msg.contains("AccessDeniedException") {
        SecretError::AccessDenied(secret_name.to_string())
    } else if error_msg.contains("DecryptionFailure") {
        SecretError::DecryptionFailed(secret_name.to_string())
    } else {
        SecretError::AwsSdk(error_msg)
    }
}
