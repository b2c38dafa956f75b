//! SMTP relay provider adapter
//!
//! Delivers through a plain SMTP relay with lettre. The transport is built
//! once during `init` and reused for every send.

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    Message, SmtpTransport, Transport,
};
use tracing::debug;

use crate::domain::delivery::{
    errors::{DeliveryError, InitializationError},
    Email, EmailAddress, EmailProvider,
};

/// SMTP relay configuration
#[derive(Clone, Default, Debug, Parser)]
pub struct SmtpConfig {
    /// The SMTP host
    #[clap(long = "smtp-host", env = "SMTP_HOST", default_value = "localhost")]
    pub host: String,

    /// The SMTP port
    #[clap(long = "smtp-port", env = "SMTP_PORT", default_value = "587")]
    pub port: u16,

    /// The SMTP username
    #[clap(long = "smtp-user", env = "SMTP_USER", default_value = "")]
    pub username: String,

    /// The SMTP password
    #[clap(long = "smtp-password", env = "SMTP_PASSWORD", default_value = "")]
    pub password: String,

    /// Verify the TLS certificate
    #[clap(long = "smtp-verify-tls", env = "SMTP_VERIFY_TLS", default_value = "true")]
    pub verify_tls: bool,

    /// Enable STARTTLS (TLS upgrade on connection)
    #[clap(long = "smtp-starttls", env = "SMTP_STARTTLS", default_value = "true")]
    pub starttls: bool,
}

/// SMTP relay provider
#[derive(Default)]
pub struct SmtpRelayProvider {
    config: SmtpConfig,
    transport: Option<SmtpTransport>,
}

impl std::fmt::Debug for SmtpRelayProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpRelayProvider")
            .field("config", &self.config)
            .field("initialized", &self.transport.is_some())
            .finish()
    }
}

impl SmtpRelayProvider {
    /// Create a new SMTP relay provider; the transport is built by `init`
    pub fn new(config: SmtpConfig) -> Self {
        Self {
            config,
            transport: None,
        }
    }

    fn build_transport(&self) -> Result<SmtpTransport> {
        let creds = Credentials::new(self.config.username.clone(), self.config.password.clone());

        let relay = if self.config.starttls {
            SmtpTransport::starttls_relay(&self.config.host)?
        } else {
            SmtpTransport::relay(&self.config.host)?
        };

        Ok(relay
            .credentials(creds)
            .port(self.config.port)
            .tls(Tls::Opportunistic(
                TlsParameters::builder(self.config.host.to_string())
                    .dangerous_accept_invalid_certs(!self.config.verify_tls)
                    .build()?,
            ))
            .build())
    }
}

fn mailbox(address: &EmailAddress) -> Result<Mailbox, DeliveryError> {
    let parsed = address
        .address()
        .parse()
        .map_err(|err: lettre::address::AddressError| DeliveryError::Transport(err.into()))?;

    let name = (!address.name().is_empty()).then(|| address.name().to_string());

    Ok(Mailbox::new(name, parsed))
}

fn message(email: &Email) -> Result<Message, DeliveryError> {
    let mut builder = Message::builder()
        .from(mailbox(&email.from)?)
        .subject(email.subject.as_str());

    for to in &email.to {
        builder = builder.to(mailbox(to)?);
    }

    for cc in &email.cc {
        builder = builder.cc(mailbox(cc)?);
    }

    for bcc in &email.bcc {
        builder = builder.bcc(mailbox(bcc)?);
    }

    let message = match &email.html {
        Some(html) => builder.multipart(MultiPart::alternative_plain_html(
            email.body.clone(),
            html.as_str().to_string(),
        )),
        None => builder.body(email.body.clone()),
    };

    message.map_err(|err| DeliveryError::Transport(err.into()))
}

#[async_trait]
impl EmailProvider for SmtpRelayProvider {
    async fn init(&mut self) -> Result<(), InitializationError> {
        self.transport = Some(self.build_transport()?);

        Ok(())
    }

    async fn send(&self, email: &Email) -> Result<(), DeliveryError> {
        let transport = self
            .transport
            .as_ref()
            .ok_or(DeliveryError::NotInitialized)?;

        debug!(from = %email.from, subject = %email.subject, "sending via SMTP relay");

        transport
            .send(&message(email)?)
            .map_err(|err| DeliveryError::Transport(err.into()))?;

        Ok(())
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}
