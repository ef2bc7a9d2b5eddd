//! Two-leg call-bridge orchestration
//!
//! For every admitted inbound call: register the call with the agent
//! platform, create the bridge toward the returned agent address, then
//! supervise the pair so that either leg ending tears the other down.

use super::ports::{
    AgentCallRequest, AgentPlatformClient, BridgedCall, CallLeg, InboundCall, SignalingPort,
};
use crate::config::AgentConfig;
use crate::domain::admission::{AdmissionDecision, CallAdmissionGate, InboundCallAttempt};
use crate::domain::session::{CallSession, LegRole};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct BridgeOrchestrator {
    gate: CallAdmissionGate,
    signaling: Arc<dyn SignalingPort>,
    agent: Arc<dyn AgentPlatformClient>,
    agent_id: String,
    destination_number: String,
    agent_sip_domain: String,
}

impl BridgeOrchestrator {
    pub fn new(
        gate: CallAdmissionGate,
        signaling: Arc<dyn SignalingPort>,
        agent: Arc<dyn AgentPlatformClient>,
        config: &AgentConfig,
    ) -> Self {
        Self {
            gate,
            signaling,
            agent,
            agent_id: config.agent_id.clone(),
            destination_number: config.destination_number.clone(),
            agent_sip_domain: config.sip_domain.clone(),
        }
    }

    /// Handle one inbound call-setup request end to end.
    ///
    /// Produces either a live supervised session or a final rejection on
    /// the inbound leg; never both, and never a half-built bridge.
    pub async fn handle_call(&self, call: InboundCall) {
        let attempt = InboundCallAttempt {
            source_address: call.source_address,
            calling_number: call.calling_number.clone(),
        };

        if let AdmissionDecision::Rejected { reason, code } = self.gate.admit(&attempt) {
            warn!(source = %call.source_address, reason, "blocked inbound call");
            self.send_rejection(&call, code).await;
            return;
        }

        let mut session = CallSession::new();
        info!(
            session = %session.id(),
            caller = %call.calling_number,
            "admitting inbound call"
        );

        let registration = match self
            .agent
            .register_call(AgentCallRequest {
                agent_id: self.agent_id.clone(),
                from_number: call.calling_number.clone(),
                to_number: self.destination_number.clone(),
                direction: "inbound".to_string(),
            })
            .await
        {
            Ok(registration) => registration,
            Err(e) => {
                error!(session = %session.id(), error = %e, "agent platform admission failed");
                session.mark_rejected();
                self.send_rejection(&call, 503).await;
                return;
            }
        };

        let destination = format!("sip:{}@{}", registration.call_id, self.agent_sip_domain);
        let legs = match self.signaling.bridge(&call, &destination).await {
            Ok(legs) => legs,
            Err(e) => {
                error!(session = %session.id(), error = %e, "bridge creation failed");
                session.mark_rejected();
                self.send_rejection(&call, 500).await;
                return;
            }
        };

        session.mark_bridged();
        info!(
            session = %session.id(),
            destination = %destination,
            "call bridged to agent platform"
        );
        tokio::spawn(supervise(session, legs));
    }

    async fn send_rejection(&self, call: &InboundCall, code: u16) {
        if let Err(e) = self.signaling.reject(call, code).await {
            warn!(error = %e, code, "failed to send rejection on inbound leg");
        }
    }
}

/// Watch both legs of a session and propagate termination symmetrically.
///
/// The peer of the first terminated leg is torn down exactly once; the
/// session ends when both legs are down.
pub async fn supervise(mut session: CallSession, legs: BridgedCall) {
    while !session.is_terminated() {
        let role = tokio::select! {
            _ = legs.leg_a.wait_terminated() => LegRole::A,
            _ = legs.leg_b.wait_terminated() => LegRole::B,
        };
        debug!(session = %session.id(), leg = ?role, "leg terminated");

        if let Some(peer) = session.leg_terminated(role) {
            let peer_leg: &Arc<dyn CallLeg> = match peer {
                LegRole::A => &legs.leg_a,
                LegRole::B => &legs.leg_b,
            };
            if let Err(e) = peer_leg.hangup().await {
                warn!(session = %session.id(), error = %e, "peer leg teardown failed");
            }
            // Teardown delivered; the peer is gone either way
            session.leg_terminated(peer);
        }
    }
    info!(session = %session.id(), "session closed");
}
