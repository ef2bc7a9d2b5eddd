//! Interface layer - External interfaces
//!
//! The HTTP surface: call-analysis webhook intake and liveness.

pub mod api;
