//! Tier handlers.
//!
//! Each stage verifies its input, signs its output, and only then touches the
//! key store. Nothing is awaited between the last mutation and the response.
use super::{AppState, RequestDeadline};
use crate::error::{AppError, AppResult, INVALID_TOKEN};
use crate::models::requests::parse_body;
use crate::models::{EmailTokenRequest, JuiceboxTokenRequest};
use crate::security::VerificationSecret;
use crate::services::MagicLinkRequest;
use crate::validators::mask_email;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    Extension,
};
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

/// Extract `<token>` from `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> AppResult<&str> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthenticated("missing authorization header".to_string()))?
        .to_str()
        .map_err(|_| AppError::Unauthenticated("malformed authorization header".to_string()))?;

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        }
        _ => Err(AppError::Unauthenticated(
            "malformed authorization header".to_string(),
        )),
    }
}

/// Stage 1: `POST /email-token`
///
/// Publishes a fresh per-subject secret, replacing any earlier one, and mails
/// the token signed with it.
pub async fn email_token(
    State(state): State<Arc<AppState>>,
    Extension(deadline): Extension<RequestDeadline>,
    body: Bytes,
) -> AppResult<StatusCode> {
    let request: EmailTokenRequest = parse_body(&body)?;
    request.validate()?;
    let masked = mask_email(&request.email);

    let issued = state.issuer.issue_verification_token(&request.email)?;

    deadline.ensure_open()?;
    state.key_store.put(&request.email, issued.secret);
    info!(email = %masked, "verification secret issued");

    let mail = MagicLinkRequest {
        recipient: request.email,
        app_name: request.app_name,
        logo_path: request.logo_path,
        token: issued.token,
    };
    deadline.run(state.mailer.send_magic_link(&mail)).await??;

    Ok(StatusCode::OK)
}

/// Stage 2: `GET /auth-token`
///
/// Exchanges a tier-1 token for a session token, consuming the subject's
/// secret so the same tier-1 token never works twice.
pub async fn auth_token(
    State(state): State<Arc<AppState>>,
    Extension(deadline): Extension<RequestDeadline>,
    headers: HeaderMap,
) -> AppResult<String> {
    let token = bearer_token(&headers)?;
    let verified = state.verifier.verify_email_token(token).map_err(|e| {
        warn!(error = %e, "verification token rejected");
        AppError::from(e)
    })?;

    let session_token = state.issuer.issue_session_token(&verified.subject)?;

    deadline.ensure_open()?;
    let previous = state.key_store.mark_consumed(&verified.subject);
    if previous != Some(VerificationSecret::Live(verified.secret)) {
        warn!(
            email = %mask_email(&verified.subject),
            "verification secret consumed or replaced concurrently"
        );
        return Err(AppError::Unauthenticated(INVALID_TOKEN.to_string()));
    }

    info!(email = %mask_email(&verified.subject), "session token issued");
    Ok(session_token)
}

/// Stage 3: `POST /juicebox-token`
///
/// Stateless: any unexpired session token may mint realm tokens repeatedly.
pub async fn juicebox_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<String> {
    let token = bearer_token(&headers)?;
    let session = state.verifier.verify_session_token(token).map_err(|e| {
        warn!(error = %e, "session token rejected");
        AppError::from(e)
    })?;

    let request: JuiceboxTokenRequest = parse_body(&body)?;
    request.validate()?;

    let realm_token = state
        .issuer
        .issue_realm_token(&session.sub, &request.realm_id)?;

    info!(
        email = %mask_email(&session.sub),
        realm_id = %request.realm_id,
        "realm token issued"
    );
    Ok(realm_token)
}
