//! Trunk registration keepalive loop
//!
//! Runs independently of call handling: one REGISTER cycle, then sleep
//! until the renewal (half the granted expiry) or the fixed retry interval.
//! The loop never terminates and never gives up.

use super::ports::SignalingPort;
use crate::domain::registration::RegistrationState;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub struct RegistrationManager {
    signaling: Arc<dyn SignalingPort>,
    retry_interval: Duration,
    state: RegistrationState,
}

impl RegistrationManager {
    pub fn new(signaling: Arc<dyn SignalingPort>, retry_interval: Duration) -> Self {
        Self {
            signaling,
            retry_interval,
            state: RegistrationState::new(),
        }
    }

    pub fn state(&self) -> &RegistrationState {
        &self.state
    }

    /// Perform one registration attempt and return the delay until the next.
    pub async fn cycle(&mut self) -> Duration {
        self.state.begin_attempt();
        match self.signaling.register().await {
            Ok(grant) => {
                self.state.confirm(grant.expires);
                info!(expires = grant.expires, "trunk registration refreshed");
            }
            Err(e) => {
                self.state.fail();
                warn!(
                    error = %e,
                    retries = self.state.retry_count(),
                    "trunk registration failed"
                );
            }
        }
        self.state.next_attempt_delay(self.retry_interval)
    }

    /// Self-rescheduling registration loop; runs until the process stops.
    pub async fn run(mut self) {
        loop {
            let delay = self.cycle().await;
            tokio::time::sleep(delay).await;
        }
    }
}
