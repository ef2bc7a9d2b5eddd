//! Ports consumed by the application services
//!
//! The signaling stack, the agent platform and the messenger API are
//! external collaborators; each is reached through one of these traits so
//! the services can be exercised against test doubles.

use crate::domain::shared::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::sync::Arc;

/// An inbound call-setup request taken off the signaling stack.
///
/// `token` identifies the pending transaction inside the gateway; the
/// orchestrator hands it back when rejecting or bridging the call.
#[derive(Debug, Clone)]
pub struct InboundCall {
    pub token: String,
    pub source_address: IpAddr,
    pub calling_number: String,
    /// Session description offered by the caller, carried into leg B as-is
    pub offer: Vec<u8>,
}

/// Granted registration returned by the provider
#[derive(Debug, Clone, Copy)]
pub struct RegistrationGrant {
    pub expires: u32,
}

/// The two live legs of a freshly created bridge
pub struct BridgedCall {
    pub leg_a: Arc<dyn CallLeg>,
    pub leg_b: Arc<dyn CallLeg>,
}

/// Call-signaling interface toward the trunk provider
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SignalingPort: Send + Sync {
    /// Send one REGISTER cycle for this system's address-of-record
    async fn register(&self) -> Result<RegistrationGrant>;

    /// Answer a pending call-setup request with a final rejection.
    ///
    /// A no-op when a final response has already been sent for this call.
    async fn reject(&self, call: &InboundCall, code: u16) -> Result<()>;

    /// Create the two-leg bridge: answer the inbound leg with the agent
    /// leg's session description, carrying the inbound offer unchanged.
    async fn bridge(&self, call: &InboundCall, destination: &str) -> Result<BridgedCall>;
}

/// One leg of an established bridge
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CallLeg: Send + Sync {
    fn id(&self) -> String;

    /// Tear this leg down
    async fn hangup(&self) -> Result<()>;

    /// Resolves once the leg has terminated; resolves immediately if it
    /// already has
    async fn wait_terminated(&self);
}

/// Call-admission request toward the agent platform
#[derive(Debug, Clone, Serialize)]
pub struct AgentCallRequest {
    pub agent_id: String,
    pub from_number: String,
    pub to_number: String,
    pub direction: String,
}

/// Successful agent-platform admission
#[derive(Debug, Clone, Deserialize)]
pub struct AgentCallRegistration {
    pub call_id: String,
}

/// Remote call-admission service on the agent platform
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AgentPlatformClient: Send + Sync {
    async fn register_call(&self, request: AgentCallRequest) -> Result<AgentCallRegistration>;
}

/// Remote send-message service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessengerClient: Send + Sync {
    async fn send_message(&self, recipient_id: &str, text: &str) -> Result<()>;
}
