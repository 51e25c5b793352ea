use reqwest::Client;
use serde::Serialize;

use super::{EmailMessage, MailClient, MailError};

const SENDGRID_URL: &str = "https://api.sendgrid.com/v3/mail/send";

pub struct SendgridMailClient {
    client: Client,
    api_key: String,
    from_email: String,
    from_name: String,
}

#[derive(Serialize)]
struct SendgridEmail {
    personalizations: Vec<Personalization>,
    from: EmailAddress,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<EmailAddress>,
    subject: String,
    content: Vec<Content>,
}

#[derive(Serialize)]
struct Personalization {
    to: Vec<EmailAddress>,
}

#[derive(Serialize)]
struct EmailAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Serialize)]
struct Content {
    #[serde(rename = "type")]
    content_type: String,
    value: String,
}

impl SendgridMailClient {
    pub fn new(api_key: &str, from_email: &str, from_name: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            from_email: from_email.to_string(),
            from_name: from_name.to_string(),
        }
    }

    fn build(&self, message: EmailMessage) -> Result<SendgridEmail, MailError> {
        let mut content = Vec::new();

        // text/plain doit précéder text/html pour SendGrid
        if let Some(text) = message.body_text {
            content.push(Content {
                content_type: "text/plain".to_string(),
                value: text,
            });
        }
        if let Some(html) = message.body_html {
            content.push(Content {
                content_type: "text/html".to_string(),
                value: html,
            });
        }
        if content.is_empty() {
            return Err(MailError::EmptyBody);
        }

        Ok(SendgridEmail {
            personalizations: vec![Personalization {
                to: vec![EmailAddress {
                    email: message.to,
                    name: None,
                }],
            }],
            from: EmailAddress {
                email: self.from_email.clone(),
                name: Some(self.from_name.clone()),
            },
            reply_to: message.reply_to.map(|email| EmailAddress { email, name: None }),
            subject: message.subject,
            content,
        })
    }
}

#[async_trait::async_trait]
impl MailClient for SendgridMailClient {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        let to = message.to.clone();
        let email = self.build(message)?;

        let response = self
            .client
            .post(SENDGRID_URL)
            .bearer_auth(&self.api_key)
            .json(&email)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Api(format!("{} - {}", status, body)));
        }

        tracing::info!(to = %to, "Email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_uses_sender_and_reply_to() {
        let client = SendgridMailClient::new("key", "noreply@pintas.store", "Pintas");
        let message = EmailMessage::html("buyer@x.com", "Subject".into(), "<p>x</p>".into())
            .reply_to("host@x.com");

        let json = serde_json::to_value(client.build(message).unwrap()).unwrap();
        assert_eq!(json["from"]["email"], "noreply@pintas.store");
        assert_eq!(json["reply_to"]["email"], "host@x.com");
        assert_eq!(json["personalizations"][0]["to"][0]["email"], "buyer@x.com");
        assert_eq!(json["content"][0]["type"], "text/html");
    }

    #[test]
    fn empty_body_rejected() {
        let client = SendgridMailClient::new("key", "a@b.c", "A");
        let message = EmailMessage {
            to: "x@y.z".into(),
            subject: "s".into(),
            body_html: None,
            body_text: None,
            reply_to: None,
        };
        assert!(matches!(client.build(message), Err(MailError::EmptyBody)));
    }
}
