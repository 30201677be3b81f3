//! Shared harness for router-level tests
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use crypto_core::SigningSecret;
use http_body_util::BodyExt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use token_service::{
    config::{
        EmailSettings, ServerSettings, Settings, SigningKeySettings, TokenSettings,
        WellKnownSettings,
    },
    http::{build_router, AppState, WellKnownDocuments},
    security::Clock,
    services::{DeliveryError, MagicLinkRequest, Mailer},
};
use tower::ServiceExt;

pub const SESSION_KEY: [u8; 32] = [0x11; 32];
pub const REALM_KEY: [u8; 32] = [0x22; 32];
pub const TENANT: &str = "juiceboxdemo";

pub fn settings() -> Settings {
    Settings {
        server: ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
            body_limit_bytes: 2048,
            request_timeout_secs: 30,
        },
        tokens: TokenSettings {
            ttl_secs: 600,
            session_issuer: "juicebox".to_string(),
        },
        signing_keys: SigningKeySettings {
            session_key: SigningSecret::from_bytes(SESSION_KEY),
            realm_key: SigningSecret::from_bytes(REALM_KEY),
            realm_key_version: 1,
            realm_tenant_name: TENANT.to_string(),
        },
        email: EmailSettings {
            smtp_host: String::new(),
            smtp_port: 465,
            smtp_username: None,
            smtp_password: None,
            use_starttls: false,
            sender_domain: "juicebox.me".to_string(),
            link_base_url: "https://demo.example.com/app".to_string(),
        },
        well_known: WellKnownSettings::default(),
    }
}

/// Captures every magic link instead of sending it
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<MagicLinkRequest>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<MagicLinkRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last_token(&self) -> String {
        self.sent
            .lock()
            .unwrap()
            .last()
            .map(|m| m.token.clone())
            .expect("no magic link sent")
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_magic_link(&self, request: &MagicLinkRequest) -> Result<(), DeliveryError> {
        self.sent.lock().unwrap().push(request.clone());
        Ok(())
    }
}

pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send_magic_link(&self, _request: &MagicLinkRequest) -> Result<(), DeliveryError> {
        Err(DeliveryError::Transport("connection refused".to_string()))
    }
}

/// Never finishes within any sane deadline
pub struct StalledMailer;

#[async_trait]
impl Mailer for StalledMailer {
    async fn send_magic_link(&self, _request: &MagicLinkRequest) -> Result<(), DeliveryError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(())
    }
}

pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.0
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub mailer: Arc<RecordingMailer>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::from_state(|state| state)
    }

    /// Build with a recording mailer after letting the caller adjust state
    pub fn from_state(configure: impl FnOnce(AppState) -> AppState) -> Self {
        let mailer = Arc::new(RecordingMailer::default());
        let (router, state) = router_with(Arc::clone(&mailer) as Arc<dyn Mailer>, configure);
        Self {
            router,
            state,
            mailer,
        }
    }

    pub async fn call(&self, request: Request<Body>) -> (StatusCode, String) {
        call(&self.router, request).await
    }

    pub async fn request_email_token(&self, email: &str) -> (StatusCode, String) {
        self.call(email_token_request(email)).await
    }

    /// Stage 1 and return the mailed token
    pub async fn mailed_token(&self, email: &str) -> String {
        let (status, _) = self.request_email_token(email).await;
        assert_eq!(status, StatusCode::OK);
        self.mailer.last_token()
    }

    pub async fn exchange_auth_token(&self, token: &str) -> (StatusCode, String) {
        self.call(auth_token_request(token)).await
    }

    pub async fn exchange_juicebox_token(
        &self,
        session_token: &str,
        realm_id: &str,
    ) -> (StatusCode, String) {
        self.call(juicebox_token_request(
            session_token,
            &format!(r#"{{"realmID":"{realm_id}"}}"#),
        ))
        .await
    }
}

/// Router and state wired to an arbitrary mailer
pub fn router_with(
    mailer: Arc<dyn Mailer>,
    configure: impl FnOnce(AppState) -> AppState,
) -> (Router, Arc<AppState>) {
    let state = Arc::new(configure(AppState::new(
        &settings(),
        mailer,
        WellKnownDocuments::default(),
    )));
    (build_router(Arc::clone(&state)), state)
}

pub async fn call(router: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

pub fn email_token_request(email: &str) -> Request<Body> {
    json_post(
        "/email-token",
        format!(r#"{{"email":"{email}","appName":"Demo","logoPath":"https://x.com/logo.png"}}"#),
    )
}

pub fn auth_token_request(token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri("/auth-token")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

pub fn juicebox_token_request(session_token: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/juicebox-token")
        .header(header::AUTHORIZATION, format!("Bearer {session_token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn json_post(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}
