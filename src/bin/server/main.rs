#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    missing_docs,
    rustdoc::broken_intra_doc_links,
    rustdoc::missing_crate_level_docs
)]

//! Failover email delivery service

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use courier::{
    domain::delivery::{EmailProvider, RoundRobinStrategy},
    infrastructure::{
        email::{
            SendGridConfig, SendGridProvider, SmtpConfig, SmtpRelayProvider, SparkPostConfig,
            SparkPostProvider,
        },
        http::{HttpServer, HttpServerConfig},
    },
};
use tracing::error;

/// Command-line arguments / environment variables
#[derive(Debug, Parser)]
pub struct Args {
    /// The HTTP server configuration
    #[clap(flatten)]
    pub server: HttpServerConfig,

    /// The SparkPost provider configuration
    #[clap(flatten)]
    pub sparkpost: SparkPostConfig,

    /// The SendGrid provider configuration
    #[clap(flatten)]
    pub sendgrid: SendGridConfig,

    /// The SMTP relay configuration
    #[clap(flatten)]
    pub smtp: SmtpConfig,
}

#[mutants::skip]
#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let mut providers: Vec<Arc<dyn EmailProvider>> = Vec::new();

    register(&mut providers, SparkPostProvider::new(args.sparkpost)).await;
    register(&mut providers, SendGridProvider::new(args.sendgrid)).await;
    register(&mut providers, SmtpRelayProvider::new(args.smtp)).await;

    let strategy = RoundRobinStrategy::new(providers);

    HttpServer::new(strategy, args.server).await?.run().await
}

/// Run a provider's one-time setup and add it to the pool.
///
/// A provider whose setup failed is registered anyway and reports the
/// failure on each delivery attempt instead of being skipped.
async fn register(
    pool: &mut Vec<Arc<dyn EmailProvider>>,
    mut provider: impl EmailProvider + 'static,
) {
    if let Err(err) = provider.init().await {
        error!(provider = provider.name(), %err, "provider failed to initialize");
    }

    pool.push(Arc::new(provider));
}
