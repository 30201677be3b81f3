/// Service layer for token-service
///
/// Provides integrations:
/// - Email service (SMTP delivery of magic links)
pub mod email;

pub use email::{DeliveryError, EmailService, MagicLinkRequest, Mailer};
