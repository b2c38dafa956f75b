//! Outbound email provider adapters

mod sendgrid;
mod smtp;
mod sparkpost;

pub use sendgrid::{SendGridConfig, SendGridProvider};
pub use smtp::{SmtpConfig, SmtpRelayProvider};
pub use sparkpost::{SparkPostConfig, SparkPostProvider};
