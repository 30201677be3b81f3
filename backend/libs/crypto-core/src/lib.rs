//! Shared cryptographic primitives for the token service.
//!
//! - `jwt`: HS256 signing secrets and JWT encode/decode helpers
//! - `hash`: SHA-256 digests and key fingerprints
//! - `correlation`: request correlation identifiers
pub mod correlation;
pub mod hash;
pub mod jwt;

pub use jwt::{KeyError, SigningSecret, SECRET_LEN};
