//! SendGrid provider adapter
//!
//! Delivers through the SendGrid v3 mail-send HTTP API.

use async_trait::async_trait;
use clap::Parser;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::domain::delivery::{
    errors::{DeliveryError, InitializationError},
    Email, EmailAddress, EmailProvider,
};

/// SendGrid configuration
#[derive(Clone, Default, Debug, Parser)]
pub struct SendGridConfig {
    /// The SendGrid API key
    #[clap(long = "sendgrid-api-key", env = "SENDGRID_API_KEY", default_value = "")]
    pub api_key: String,

    /// The SendGrid API base URL
    #[clap(
        long = "sendgrid-base-url",
        env = "SENDGRID_BASE_URL",
        default_value = "https://api.sendgrid.com"
    )]
    pub base_url: String,
}

/// SendGrid provider
#[derive(Debug)]
pub struct SendGridProvider {
    config: SendGridConfig,
    client: Client,
}

impl SendGridProvider {
    /// Create a new SendGrid provider
    pub fn new(config: SendGridConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct MailSendRequest {
    personalizations: Vec<Personalization>,
    from: Recipient,
    subject: String,
    content: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Personalization {
    to: Vec<Recipient>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    cc: Vec<Recipient>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    bcc: Vec<Recipient>,
}

#[derive(Debug, Serialize)]
struct Recipient {
    email: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl From<&EmailAddress> for Recipient {
    fn from(address: &EmailAddress) -> Self {
        Self {
            email: address.address().to_string(),
            name: (!address.name().is_empty()).then(|| address.name().to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(rename = "type")]
    content_type: String,
    value: String,
}

fn mail_send_request(email: &Email) -> MailSendRequest {
    let mut content = Vec::new();

    if !email.body.is_empty() {
        content.push(Content {
            content_type: "text/plain".to_string(),
            value: email.body.clone(),
        });
    }

    if let Some(html) = &email.html {
        content.push(Content {
            content_type: "text/html".to_string(),
            value: html.as_str().to_string(),
        });
    }

    MailSendRequest {
        personalizations: vec![Personalization {
            to: email.to.iter().map(Recipient::from).collect(),
            cc: email.cc.iter().map(Recipient::from).collect(),
            bcc: email.bcc.iter().map(Recipient::from).collect(),
        }],
        from: Recipient::from(&email.from),
        subject: email.subject.as_str().to_string(),
        content,
    }
}

#[async_trait]
impl EmailProvider for SendGridProvider {
    async fn init(&mut self) -> Result<(), InitializationError> {
        // The API client is stateless, nothing to set up
        Ok(())
    }

    async fn send(&self, email: &Email) -> Result<(), DeliveryError> {
        debug!(from = %email.from, subject = %email.subject, "sending via SendGrid");

        let response = self
            .client
            .post(format!("{}/v3/mail/send", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&mail_send_request(email))
            .send()
            .await
            .map_err(|err| DeliveryError::Transport(err.into()))?;

        let status = response.status();

        if status.is_success() {
            Ok(())
        } else {
            Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            })
        }
    }

    fn name(&self) -> &'static str {
        "sendgrid"
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::domain::delivery::{HtmlBody, Subject};

    use super::*;

    fn email() -> Email {
        Email {
            from: EmailAddress::new("Sender", "sender@example.com").unwrap(),
            to: vec![EmailAddress::new("Jo", "jo@example.com").unwrap()],
            cc: vec![EmailAddress::new("", "cc@example.com").unwrap()],
            bcc: vec![],
            subject: Subject::new("greetings").unwrap(),
            body: "hello".to_string(),
            html: Some(HtmlBody::new("<p>hello</p>")),
        }
    }

    #[test]
    fn test_request_payload_shape() -> TestResult {
        let payload = serde_json::to_value(mail_send_request(&email()))?;

        assert_eq!(
            payload,
            serde_json::json!({
                "personalizations": [{
                    "to": [{ "email": "jo@example.com", "name": "Jo" }],
                    "cc": [{ "email": "cc@example.com" }],
                }],
                "from": { "email": "sender@example.com", "name": "Sender" },
                "subject": "greetings",
                "content": [
                    { "type": "text/plain", "value": "hello" },
                    { "type": "text/html", "value": "<p>hello</p>" },
                ],
            })
        );

        Ok(())
    }

    #[test]
    fn test_html_part_is_omitted_when_absent() -> TestResult {
        let mut email = email();
        email.html = None;

        let payload = serde_json::to_value(mail_send_request(&email))?;

        assert_eq!(
            payload["content"],
            serde_json::json!([{ "type": "text/plain", "value": "hello" }])
        );

        Ok(())
    }
}
