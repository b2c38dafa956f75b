//! Email delivery domain: validated message values, the provider capability
//! each backend implements, and the failover strategy that walks the pool.

mod email;
mod provider;
mod strategy;

pub mod errors;

pub use email::{Email, EmailAddress, HtmlBody, Subject, SUBJECT_MAX_CHARS};
pub use provider::EmailProvider;
pub use strategy::{DeliveryStrategy, RoundRobinStrategy};

#[cfg(test)]
pub mod tests {
    pub use super::strategy::MockDeliveryStrategy;
}
