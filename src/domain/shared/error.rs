//! Domain errors

use thiserror::Error;

/// Domain result type
pub type Result<T> = std::result::Result<T, DomainError>;

#[derive(Error, Debug, Clone)]
pub enum DomainError {
    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Registration rejected: {0}")]
    AuthRejected(String),

    #[error("Untrusted source: {0}")]
    UntrustedSource(String),

    #[error("Agent platform declined the call: {0}")]
    AdmissionRejected(String),

    #[error("Bridge creation failed: {0}")]
    BridgeFailed(String),

    #[error("Notification delivery failed: {0}")]
    NotificationFailed(String),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}
