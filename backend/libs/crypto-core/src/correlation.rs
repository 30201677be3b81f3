//! Correlation ID utilities for request tracing
//!
//! ## Implementation Pattern
//! 1. HTTP: Extract from X-Correlation-ID header or generate UUID
//! 2. Echo the ID on the response so clients can quote it
//! 3. Logging: recorded as a field on the request span
use std::fmt;
use uuid::Uuid;

/// HTTP header for correlation ID
pub const HTTP_CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Upper bound on accepted inbound IDs; longer values are replaced
const MAX_CORRELATION_ID_LEN: usize = 128;

/// Correlation identifier attached to one inbound request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Generate new correlation ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Reuse the caller's ID when it is short printable ASCII, otherwise
    /// generate a fresh one.
    pub fn from_header_or_generate(value: Option<&str>) -> Self {
        match value {
            Some(id)
                if !id.is_empty()
                    && id.len() <= MAX_CORRELATION_ID_LEN
                    && id.bytes().all(|b| b.is_ascii_graphic()) =>
            {
                Self(id.to_string())
            }
            _ => Self::generate(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_id_generation() {
        let id = CorrelationId::generate();
        assert_eq!(id.as_str().len(), 36); // UUID v4 format
    }

    #[test]
    fn test_inbound_id_is_kept() {
        let id = CorrelationId::from_header_or_generate(Some("req-123"));
        assert_eq!(id.as_str(), "req-123");
    }

    #[test]
    fn test_unusable_inbound_id_is_replaced() {
        for bad in [Some(""), Some("has space"), Some("tab\there")] {
            assert_eq!(CorrelationId::from_header_or_generate(bad).as_str().len(), 36);
        }
        let long = "x".repeat(MAX_CORRELATION_ID_LEN + 1);
        assert_ne!(
            CorrelationId::from_header_or_generate(Some(&long)).as_str(),
            long
        );
        assert_eq!(CorrelationId::from_header_or_generate(None).as_str().len(), 36);
    }
}
