//! trunklink - SIP trunk to AI voice-agent bridging orchestrator
//!
//! trunklink keeps a registration alive with an upstream SIP trunk provider,
//! admits inbound calls by source address, bridges each accepted call to an
//! AI voice-agent platform as a second leg, and routes post-call analysis
//! events to messenger recipients.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interface;

// Re-export commonly used types
pub use domain::shared::error::DomainError;
pub use domain::shared::result::Result;
