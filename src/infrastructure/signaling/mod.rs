//! SIP signaling adapter
//!
//! The protocol itself (framing, transactions, dialogs) lives in the
//! rsipstack crate; this module wires it to the application's ports.

mod gateway;
mod legs;

pub use gateway::RsipstackGateway;
pub use legs::{AgentLeg, TrunkLeg};
