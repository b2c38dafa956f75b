//! SparkPost provider adapter
//!
//! Delivers through the SparkPost transmissions HTTP API. The API client is
//! an instance field populated during `init`, so a provider that never
//! initialized reports that on every send instead of panicking.

use async_trait::async_trait;
use clap::Parser;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::domain::delivery::{
    errors::{DeliveryError, InitializationError},
    Email, EmailAddress, EmailProvider,
};

/// SparkPost configuration
#[derive(Clone, Default, Debug, Parser)]
pub struct SparkPostConfig {
    /// The SparkPost API key
    #[clap(
        long = "sparkpost-api-key",
        env = "SPARKPOST_API_KEY",
        default_value = ""
    )]
    pub api_key: String,

    /// The SparkPost API base URL
    #[clap(
        long = "sparkpost-base-url",
        env = "SPARKPOST_BASE_URL",
        default_value = "https://api.sparkpost.com"
    )]
    pub base_url: String,
}

/// SparkPost provider
#[derive(Debug, Default)]
pub struct SparkPostProvider {
    config: SparkPostConfig,
    client: Option<Client>,
}

impl SparkPostProvider {
    /// Create a new SparkPost provider; the client is built by `init`
    pub fn new(config: SparkPostConfig) -> Self {
        Self {
            config,
            client: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct Transmission {
    content: TransmissionContent,
    recipients: Vec<TransmissionRecipient>,
}

#[derive(Debug, Serialize)]
struct TransmissionContent {
    from: SparkPostAddress,
    subject: String,
    text: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    headers: Option<TransmissionHeaders>,
}

#[derive(Debug, Serialize)]
struct TransmissionHeaders {
    cc: String,
}

#[derive(Debug, Serialize)]
struct TransmissionRecipient {
    address: SparkPostAddress,
}

#[derive(Debug, Serialize)]
struct SparkPostAddress {
    email: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    header_to: Option<String>,
}

impl SparkPostAddress {
    fn sender(address: &EmailAddress) -> Self {
        Self {
            email: address.address().to_string(),
            name: (!address.name().is_empty()).then(|| address.name().to_string()),
            header_to: None,
        }
    }

    fn recipient(address: &EmailAddress, header_to: &str) -> Self {
        Self {
            email: address.address().to_string(),
            name: (!address.name().is_empty()).then(|| address.name().to_string()),
            header_to: Some(header_to.to_string()),
        }
    }
}

/// Expand To/Cc/Bcc into the flat SparkPost recipient list.
///
/// Every recipient carries the joined To list as its `header_to`, and Cc
/// addresses are repeated in the message headers, so the rendered message
/// shows the same recipients a plain MUA would.
fn transmission(email: &Email) -> Transmission {
    let header_to = email
        .to
        .iter()
        .map(EmailAddress::address)
        .collect::<Vec<_>>()
        .join(",");

    let recipients = email
        .to
        .iter()
        .chain(email.cc.iter())
        .chain(email.bcc.iter())
        .map(|address| TransmissionRecipient {
            address: SparkPostAddress::recipient(address, &header_to),
        })
        .collect();

    let cc_header = (!email.cc.is_empty()).then(|| TransmissionHeaders {
        cc: email
            .cc
            .iter()
            .map(EmailAddress::address)
            .collect::<Vec<_>>()
            .join(","),
    });

    Transmission {
        content: TransmissionContent {
            from: SparkPostAddress::sender(&email.from),
            subject: email.subject.as_str().to_string(),
            text: email.body.clone(),
            html: email.html.as_ref().map(|html| html.as_str().to_string()),
            headers: cc_header,
        },
        recipients,
    }
}

#[async_trait]
impl EmailProvider for SparkPostProvider {
    async fn init(&mut self) -> Result<(), InitializationError> {
        let client = Client::builder().build().map_err(anyhow::Error::from)?;

        self.client = Some(client);

        Ok(())
    }

    async fn send(&self, email: &Email) -> Result<(), DeliveryError> {
        let client = self.client.as_ref().ok_or(DeliveryError::NotInitialized)?;

        debug!(from = %email.from, subject = %email.subject, "sending via SparkPost");

        let response = client
            .post(format!("{}/api/v1/transmissions", self.config.base_url))
            .header("Authorization", self.config.api_key.as_str())
            .json(&transmission(email))
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
        "sparkpost"
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::domain::delivery::Subject;

    use super::*;

    fn email() -> Email {
        Email {
            from: EmailAddress::new("Sender", "sender@example.com").unwrap(),
            to: vec![
                EmailAddress::new("Jo", "jo@example.com").unwrap(),
                EmailAddress::new("", "sam@example.com").unwrap(),
            ],
            cc: vec![EmailAddress::new("", "cc@example.com").unwrap()],
            bcc: vec![EmailAddress::new("", "bcc@example.com").unwrap()],
            subject: Subject::new("greetings").unwrap(),
            body: "hello".to_string(),
            html: None,
        }
    }

    #[tokio::test]
    async fn test_send_before_init_reports_not_initialized() {
        let provider = SparkPostProvider::new(SparkPostConfig::default());

        let result = provider.send(&email()).await;

        assert!(matches!(result, Err(DeliveryError::NotInitialized)));
    }

    #[test]
    fn test_recipient_list_is_expanded_from_all_fields() -> TestResult {
        let payload = serde_json::to_value(transmission(&email()))?;

        let recipients = payload["recipients"].as_array().unwrap();

        assert_eq!(recipients.len(), 4);

        // Every recipient sees the joined To list in its rendered header.
        for recipient in recipients {
            assert_eq!(
                recipient["address"]["header_to"],
                "jo@example.com,sam@example.com"
            );
        }

        Ok(())
    }

    #[test]
    fn test_cc_header_lists_cc_addresses() -> TestResult {
        let payload = serde_json::to_value(transmission(&email()))?;

        assert_eq!(payload["content"]["headers"]["cc"], "cc@example.com");

        Ok(())
    }

    #[test]
    fn test_cc_header_is_omitted_without_cc_recipients() -> TestResult {
        let mut email = email();
        email.cc = vec![];

        let payload = serde_json::to_value(transmission(&email))?;

        assert!(payload["content"].get("headers").is_none());

        Ok(())
    }
}
