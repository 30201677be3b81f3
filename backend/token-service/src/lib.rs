/// Token Service Library
///
/// Email-verified, three-tier bearer token issuance: a client proves control
/// of an email address, exchanges the mailed token for a session token, and
/// exchanges that for realm-scoped tokens.
///
/// ## Modules
///
/// - `config`: Service configuration
/// - `error`: HTTP-facing error type
/// - `http`: Router, tier handlers, middleware
/// - `models`: Claim sets and request bodies
/// - `security`: Ephemeral key store, token issuer and verifier
/// - `services`: Email delivery
/// - `validators`: Input validation
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod security;
pub mod services;
pub mod validators;

// Re-export commonly used types
pub use error::{AppError, AppResult};
