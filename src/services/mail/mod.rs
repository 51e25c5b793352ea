use std::sync::Arc;

use thiserror::Error;

use crate::config::Config;

mod sendgrid;
pub mod templates;

pub use sendgrid::SendgridMailClient;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("SendGrid API key not configured")]
    NotConfigured,

    #[error("Email must have either HTML or text body")]
    EmptyBody,

    #[error("SendGrid API error: {0}")]
    Api(String),

    #[error("Failed to send email via SendGrid: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body_html: Option<String>,
    pub body_text: Option<String>,
    /// Adresse du créateur: les réponses lui arrivent directement
    pub reply_to: Option<String>,
}

impl EmailMessage {
    pub fn html(to: &str, subject: String, html: String) -> Self {
        EmailMessage {
            to: to.to_string(),
            subject,
            body_html: Some(html),
            body_text: None,
            reply_to: None,
        }
    }

    pub fn reply_to(mut self, email: &str) -> Self {
        if !email.trim().is_empty() {
            self.reply_to = Some(email.to_string());
        }
        self
    }
}

#[async_trait::async_trait]
pub trait MailClient: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError>;
}

pub type DynMailClient = Arc<dyn MailClient>;

/// Client utilisé sans clé SendGrid: journalise l'envoi et signale l'échec
pub struct DisabledMailClient;

#[async_trait::async_trait]
impl MailClient for DisabledMailClient {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        tracing::warn!(
            to = %message.to,
            subject = %message.subject,
            "SendGrid API key not found, email not sent"
        );
        Err(MailError::NotConfigured)
    }
}

pub fn create_mail_client(config: &Config) -> DynMailClient {
    match config.sendgrid_api_key.as_deref().filter(|key| !key.is_empty()) {
        Some(api_key) => Arc::new(SendgridMailClient::new(
            api_key,
            &config.mail_from_email,
            &config.mail_from_name,
        )),
        None => Arc::new(DisabledMailClient),
    }
}
