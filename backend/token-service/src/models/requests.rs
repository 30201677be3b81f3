use crate::error::AppError;
use serde::Deserialize;
use validator::Validate;

/// Body of `POST /email-token`
///
/// `appName` and `logoPath` only brand the outgoing message.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EmailTokenRequest {
    #[validate(email, length(max = 254))]
    pub email: String,
    #[serde(default)]
    pub app_name: String,
    #[serde(default)]
    pub logo_path: String,
}

/// Body of `POST /juicebox-token`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct JuiceboxTokenRequest {
    #[serde(rename = "realmID")]
    #[validate(
        length(min = 1, max = 128),
        custom(function = "crate::validators::validate_realm_id_shape_validator")
    )]
    pub realm_id: String,
}

/// Decode a JSON request body, mapping any failure to a 400
pub fn parse_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| {
        AppError::MalformedRequest(format!("Error unmarshalling request body: {e}"))
    })
}
