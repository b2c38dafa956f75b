//! Error types for the delivery domain

use thiserror::Error;

/// Errors raised while validating request fields into email values
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The address does not parse as an RFC 5322 mailbox
    #[error("\"{0}\" is not a valid email address")]
    InvalidAddress(String),

    /// The subject is empty
    #[error("subject must not be empty")]
    EmptySubject,

    /// The subject exceeds the header line-length convention
    #[error("subject must not be longer than 78 characters")]
    SubjectTooLong,
}

/// Error raised by a provider's one-time setup
#[derive(Debug, Error)]
#[error("provider initialization failed: {0}")]
pub struct InitializationError(#[from] pub anyhow::Error);

/// Errors raised by a single delivery attempt.
///
/// The failover strategy treats every variant the same way and moves on to
/// the next provider in the pool.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The provider was asked to send before its setup completed
    #[error("provider has not been initialized")]
    NotInitialized,

    /// The backend answered with a non-success status
    #[error("provider rejected the message with status {status}: {body}")]
    Rejected {
        /// HTTP status code returned by the backend
        status: u16,

        /// Response body returned by the backend
        body: String,
    },

    /// The request never produced an answer
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

/// Errors raised by the failover strategy once the pool is exhausted
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    /// The pool is empty, delivery is categorically impossible
    #[error("no providers are registered, so the message cannot be delivered")]
    NoProviders,

    /// Every provider in the pool reported a delivery failure
    #[error("all {0} providers failed to deliver the message")]
    AllProvidersFailed(usize),
}
