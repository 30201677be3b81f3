/// Data models shared by the token lifecycle and the HTTP surface
pub mod claims;
pub mod requests;

pub use claims::{RealmClaims, SessionClaims, VerificationClaims};
pub use requests::{EmailTokenRequest, JuiceboxTokenRequest};
