//! Email service for delivering magic-link verification emails
use crate::config::EmailSettings;
use crate::validators::mask_email;
use async_trait::async_trait;
use lettre::message::{header, Mailbox, Message, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

const SUBJECT: &str = "Confirm your e-mail";

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("invalid address: {0}")]
    Address(String),

    #[error("failed to build email message: {0}")]
    Message(String),

    #[error("failed to send email: {0}")]
    Transport(String),

    #[error("failed to configure SMTP transport: {0}")]
    Config(String),
}

/// One magic-link email
#[derive(Debug, Clone)]
pub struct MagicLinkRequest {
    pub recipient: String,
    /// Display name of the sender and heading of the message
    pub app_name: String,
    /// Optional logo URL shown above the heading
    pub logo_path: String,
    /// Tier-1 token carried by the link
    pub token: String,
}

/// Outbound delivery of verification links
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_magic_link(&self, request: &MagicLinkRequest) -> Result<(), DeliveryError>;
}

/// Async email transport wrapper (SMTP or no-op)
#[derive(Clone)]
pub struct EmailService {
    transport: Option<Arc<AsyncSmtpTransport<Tokio1Executor>>>,
    sender_domain: String,
    link_base_url: String,
}

impl EmailService {
    /// Build email service from configuration
    ///
    /// If SMTP host is empty, operates in no-op mode (logs only).
    /// Useful for development and testing without email infrastructure.
    pub fn new(config: &EmailSettings) -> Result<Self, DeliveryError> {
        let transport = if config.smtp_host.trim().is_empty() {
            warn!("SMTP host not configured; email service will operate in no-op mode");
            None
        } else {
            let builder = if config.use_starttls {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            } else {
                AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            }
            .map_err(|e| DeliveryError::Config(e.to_string()))?
            .port(config.smtp_port);

            let builder = if let (Some(username), Some(password)) =
                (&config.smtp_username, &config.smtp_password)
            {
                builder.credentials(Credentials::new(username.to_string(), password.to_string()))
            } else {
                builder
            };

            Some(Arc::new(builder.build()))
        };

        Ok(Self {
            transport,
            sender_domain: config.sender_domain.clone(),
            link_base_url: config.link_base_url.clone(),
        })
    }

    /// Check if SMTP transport is enabled
    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    /// Link the recipient opens; the token is query-escaped
    pub fn build_magic_link(&self, token: &str) -> String {
        format!(
            "{}?token={}",
            self.link_base_url,
            urlencoding::encode(token)
        )
    }

    /// Fresh `no-reply-<uuid>@domain` sender, named after the app
    fn sender(&self, app_name: &str) -> Result<Mailbox, DeliveryError> {
        let address = Address::new(format!("no-reply-{}", Uuid::new_v4()), &self.sender_domain)
            .map_err(|e| DeliveryError::Address(format!("sender: {e}")))?;
        let name = (!app_name.is_empty()).then(|| app_name.to_string());
        Ok(Mailbox::new(name, address))
    }

    fn build_message(&self, request: &MagicLinkRequest) -> Result<Message, DeliveryError> {
        let to = request
            .recipient
            .parse::<Mailbox>()
            .map_err(|e| DeliveryError::Address(format!("recipient: {e}")))?;

        let link = self.build_magic_link(&request.token);
        let html_body = render_html(&request.app_name, &request.logo_path, &link);
        let text_body = render_text(&request.app_name, &link);

        Message::builder()
            .from(self.sender(&request.app_name)?)
            .to(to)
            .subject(SUBJECT)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(text_body),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(html_body),
                    ),
            )
            .map_err(|e| DeliveryError::Message(e.to_string()))
    }
}

#[async_trait]
impl Mailer for EmailService {
    async fn send_magic_link(&self, request: &MagicLinkRequest) -> Result<(), DeliveryError> {
        let email = self.build_message(request)?;
        let recipient = mask_email(&request.recipient);

        if let Some(transport) = &self.transport {
            transport
                .send(email)
                .await
                .map_err(|e| DeliveryError::Transport(e.to_string()))?;
            info!(recipient = %recipient, "magic link email sent");
        } else {
            info!(
                recipient = %recipient,
                "Email service running in no-op mode; skipping actual send"
            );
        }
        Ok(())
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn render_html(app_name: &str, logo_path: &str, link: &str) -> String {
    let app_name = escape_html(app_name);
    let link = escape_html(link);
    let logo = if logo_path.is_empty() {
        String::new()
    } else {
        format!(
            r#"<img src="{}" alt="{app_name}" style="max-height: 64px; margin-bottom: 20px;">"#,
            escape_html(logo_path)
        )
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
</head>
<body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; padding: 20px; color: #333;">
    {logo}
    <h2>{app_name}</h2>
    <p>Tap the button below to confirm your e-mail address.</p>
    <p style="margin: 30px 0;">
        <a href="{link}" style="background-color: #000; color: #fff; padding: 14px 28px; text-decoration: none; border-radius: 25px; display: inline-block;">Confirm e-mail</a>
    </p>
    <p style="color: #999; font-size: 12px; margin-top: 30px;">
        If you did not request this, please ignore this email.
    </p>
</body>
</html>"#
    )
}

fn render_text(app_name: &str, link: &str) -> String {
    let heading = if app_name.is_empty() {
        "Confirm your e-mail address"
    } else {
        app_name
    };
    format!(
        "{heading}\n\nOpen the following link to confirm your e-mail address:\n{link}\n\nIf you did not request this, please ignore this email."
    )
}
