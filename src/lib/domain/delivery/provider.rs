//! Provider capability

use async_trait::async_trait;

use super::{
    errors::{DeliveryError, InitializationError},
    Email,
};

/// An outbound email backend.
///
/// The pool holds providers as trait objects, so any number of backends can
/// be registered.
#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// One-time setup, called exactly once per instance before the provider
    /// joins the pool.
    ///
    /// A provider whose setup failed stays in the pool; it reports the
    /// failure on each delivery attempt instead of being skipped.
    async fn init(&mut self) -> Result<(), InitializationError>;

    /// Attempt exactly one delivery of `email` through this backend.
    ///
    /// Implementations never retry internally; retrying across the pool is
    /// the strategy's job. Every backend failure mode is reported as a
    /// [`DeliveryError`].
    async fn send(&self, email: &Email) -> Result<(), DeliveryError>;

    /// Identifier used in log lines
    fn name(&self) -> &'static str;
}
