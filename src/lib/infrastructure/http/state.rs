//! Application state module

use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};

use crate::domain::delivery::DeliveryStrategy;

/// Global application state
pub struct AppState<S: DeliveryStrategy> {
    /// The time the server started
    pub start_time: DateTime<Utc>,

    /// The delivery strategy requests are sent through
    pub strategy: Arc<S>,
}

impl<S: DeliveryStrategy> AppState<S> {
    /// Create a new application state
    pub fn new(strategy: S) -> Self {
        Self {
            start_time: Utc::now(),
            strategy: Arc::new(strategy),
        }
    }
}

impl<S: DeliveryStrategy> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            start_time: self.start_time,
            strategy: Arc::clone(&self.strategy),
        }
    }
}

impl<S: DeliveryStrategy> fmt::Debug for AppState<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("start_time", &self.start_time)
            .field("strategy", &"DeliveryStrategy")
            .finish()
    }
}

#[cfg(test)]
use crate::domain::delivery::tests::MockDeliveryStrategy;

#[cfg(test)]
pub fn test_state(strategy: Option<MockDeliveryStrategy>) -> AppState<MockDeliveryStrategy> {
    AppState::new(strategy.unwrap_or_else(MockDeliveryStrategy::new))
}
