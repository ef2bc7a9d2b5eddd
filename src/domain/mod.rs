//! Domain layer - Core business logic and rules
//!
//! Pure state machines and policies with no I/O: the registration keepalive
//! state, the source-address admission gate, the bridged-session state
//! machine, and the notification routing policy.

pub mod admission;
pub mod notification;
pub mod registration;
pub mod session;
pub mod shared;

// Re-export commonly used types
pub use shared::{DomainError, Result};
