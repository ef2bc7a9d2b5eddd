//! Bridged call session state machine
//!
//! A session links the inbound trunk leg (A) to the outbound agent-platform
//! leg (B). Leg terminations are paired: the first leg to terminate causes
//! exactly one teardown of its peer, and the session is gone once both legs
//! are down.

use super::shared::SessionId;
use chrono::{DateTime, Utc};

/// Which side of the bridge a leg is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegRole {
    /// Inbound leg from the trunk provider
    A,
    /// Outbound leg to the agent platform
    B,
}

impl LegRole {
    pub fn peer(&self) -> LegRole {
        match self {
            LegRole::A => LegRole::B,
            LegRole::B => LegRole::A,
        }
    }
}

/// Per-leg lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegState {
    Active,
    Terminated,
}

/// Per-session bridge state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// Admission and leg B setup in progress
    Negotiating,
    /// Both legs up, media flowing between trunk and agent
    Bridged,
    /// One leg is down, peer teardown in flight
    Terminating,
    /// Both legs down (terminal)
    Terminated,
    /// Setup failed before the bridge existed (terminal)
    Rejected,
}

/// A single bridged call, owned by its supervisor for its entire lifetime
#[derive(Debug, Clone)]
pub struct CallSession {
    id: SessionId,
    state: BridgeState,
    leg_a: LegState,
    leg_b: LegState,
    created_at: DateTime<Utc>,
}

impl CallSession {
    pub fn new() -> Self {
        Self {
            id: SessionId::new(),
            state: BridgeState::Negotiating,
            leg_a: LegState::Active,
            leg_b: LegState::Active,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn leg_state(&self, role: LegRole) -> LegState {
        match role {
            LegRole::A => self.leg_a,
            LegRole::B => self.leg_b,
        }
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self.state, BridgeState::Terminated | BridgeState::Rejected)
    }

    /// Both legs answered, bridge is live
    pub fn mark_bridged(&mut self) {
        if self.state == BridgeState::Negotiating {
            self.state = BridgeState::Bridged;
        }
    }

    /// Setup failed before the bridge existed
    pub fn mark_rejected(&mut self) {
        if self.state == BridgeState::Negotiating {
            self.state = BridgeState::Rejected;
        }
    }

    /// Record that a leg reached its end of life.
    ///
    /// Returns the peer to tear down, exactly once: the first termination of
    /// a live bridge yields `Some(peer)`; repeated terminations of the same
    /// leg, or terminations once the peer is already down, yield `None`.
    pub fn leg_terminated(&mut self, role: LegRole) -> Option<LegRole> {
        if !matches!(self.state, BridgeState::Bridged | BridgeState::Terminating) {
            return None;
        }
        if self.leg_state(role) == LegState::Terminated {
            return None;
        }

        match role {
            LegRole::A => self.leg_a = LegState::Terminated,
            LegRole::B => self.leg_b = LegState::Terminated,
        }

        let peer = role.peer();
        if self.leg_state(peer) == LegState::Active {
            self.state = BridgeState::Terminating;
            Some(peer)
        } else {
            self.state = BridgeState::Terminated;
            None
        }
    }
}

impl Default for CallSession {
    fn default() -> Self {
        Self::new()
    }
}
