//! Request-scoped middleware: correlation ids and deadlines
use super::AppState;
use crate::error::AppError;
use axum::{
    extract::{Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use crypto_core::correlation::{CorrelationId, HTTP_CORRELATION_ID_HEADER};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::Instrument;

/// Attach a correlation id to the request span and echo it on the response
pub async fn correlation_id_middleware(mut request: Request, next: Next) -> Response {
    let id = CorrelationId::from_header_or_generate(
        request
            .headers()
            .get(HTTP_CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok()),
    );

    let span = tracing::info_span!(
        "request",
        correlation_id = %id,
        method = %request.method(),
        path = %request.uri().path(),
    );
    request.extensions_mut().insert(id.clone());

    let mut response = next.run(request).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(id.as_str()) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(HTTP_CORRELATION_ID_HEADER), value);
    }
    response
}

/// Point in time after which a request must not change any state
#[derive(Debug, Clone, Copy)]
pub struct RequestDeadline {
    at: Instant,
}

impl RequestDeadline {
    pub fn after(timeout: Duration) -> Self {
        Self {
            at: Instant::now() + timeout,
        }
    }

    /// Checked right before every key-store mutation
    pub fn ensure_open(&self) -> Result<(), AppError> {
        if Instant::now() >= self.at {
            Err(AppError::ClientClosedRequest)
        } else {
            Ok(())
        }
    }

    /// Bound `fut` by the deadline
    pub async fn run<F, T>(&self, fut: F) -> Result<T, AppError>
    where
        F: Future<Output = T>,
    {
        tokio::time::timeout_at(self.at, fut)
            .await
            .map_err(|_| AppError::ClientClosedRequest)
    }
}

/// Stamp every request with `now + request_timeout`
pub async fn deadline_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    request
        .extensions_mut()
        .insert(RequestDeadline::after(state.request_timeout));
    next.run(request).await
}
