//! Failover delivery strategy

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use tracing::{debug, warn};

#[cfg(test)]
use mockall::mock;

use super::{errors::SendError, Email, EmailProvider};

/// Picks providers and retries across the pool until one delivers
#[async_trait]
pub trait DeliveryStrategy: Send + Sync + 'static {
    /// Deliver `email` through one of the registered providers.
    ///
    /// # Returns
    /// A [`Result`] which is [`Ok`] once a provider accepted the message,
    /// or an [`Err`] containing a [`SendError`] when the pool is empty or
    /// every provider failed.
    async fn send(&self, email: &Email) -> Result<(), SendError>;
}

#[cfg(test)]
mock! {
    pub DeliveryStrategy {}

    #[async_trait]
    impl DeliveryStrategy for DeliveryStrategy {
        async fn send(&self, email: &Email) -> Result<(), SendError>;
    }
}

/// Round-robin failover with a sticky cursor.
///
/// Attempts start at the provider that last delivered successfully and wrap
/// forward in registration order. Each call makes at most one attempt per
/// provider; only a success moves the cursor.
pub struct RoundRobinStrategy {
    providers: Vec<Arc<dyn EmailProvider>>,
    cursor: AtomicUsize,
}

impl RoundRobinStrategy {
    /// Create a strategy over `providers`, in registration order
    pub fn new(providers: Vec<Arc<dyn EmailProvider>>) -> Self {
        Self {
            providers,
            cursor: AtomicUsize::new(0),
        }
    }
}

impl std::fmt::Debug for RoundRobinStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoundRobinStrategy")
            .field("providers", &self.providers.len())
            .field("cursor", &self.cursor)
            .finish()
    }
}

#[async_trait]
impl DeliveryStrategy for RoundRobinStrategy {
    async fn send(&self, email: &Email) -> Result<(), SendError> {
        let count = self.providers.len();

        if count == 0 {
            return Err(SendError::NoProviders);
        }

        // The cursor only ever holds indexes stored below, so it is already
        // in range; the modulo also bounds the walk to one pass.
        let start = self.cursor.load(Ordering::Acquire);

        for offset in 0..count {
            let index = (start + offset) % count;
            let provider = &self.providers[index];

            match provider.send(email).await {
                Ok(()) => {
                    self.cursor.store(index, Ordering::Release);
                    debug!(provider = provider.name(), "message delivered");

                    return Ok(());
                }
                Err(err) => {
                    warn!(provider = provider.name(), %err, "delivery attempt failed");
                }
            }
        }

        Err(SendError::AllProvidersFailed(count))
    }
}
