//! Input validation utilities for token service
use validator::ValidationError;

/// Realm identifiers are opaque; only reject characters that cannot sit in
/// a sensible audience claim. Length is checked on the request type.
pub fn validate_realm_id(realm_id: &str) -> bool {
    !realm_id.chars().any(|c| c.is_control() || c.is_whitespace())
}

/// `validator` adapter for [`validate_realm_id`]
pub fn validate_realm_id_shape_validator(realm_id: &str) -> Result<(), ValidationError> {
    if validate_realm_id(realm_id) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_realm_id"))
    }
}

/// Mask email for logging
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => match local.chars().next() {
            Some(first) if local.chars().count() > 2 => format!("{first}***@{domain}"),
            _ => format!("**@{domain}"),
        },
        None => "***@***".to_string(),
    }
}
