//! Trunk registration keepalive state machine
//!
//! Tracks the registration this process holds with the upstream trunk
//! provider. A successful cycle schedules the renewal at half the granted
//! expiry; a failed cycle schedules a retry at a fixed interval.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// Registration lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    /// No registration attempt has been made yet
    Unregistered,
    /// A REGISTER request is in flight
    Pending,
    /// The provider acknowledged the registration
    Registered,
    /// The last attempt failed (transport error or auth rejection)
    Failed,
}

/// Process-wide registration state, owned by the registration manager task
#[derive(Debug, Clone)]
pub struct RegistrationState {
    status: RegistrationStatus,
    expiry_seconds: u32,
    retry_count: u32,
    last_transition: DateTime<Utc>,
}

impl RegistrationState {
    pub fn new() -> Self {
        Self {
            status: RegistrationStatus::Unregistered,
            expiry_seconds: 0,
            retry_count: 0,
            last_transition: Utc::now(),
        }
    }

    pub fn status(&self) -> RegistrationStatus {
        self.status
    }

    pub fn expiry_seconds(&self) -> u32 {
        self.expiry_seconds
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn last_transition(&self) -> DateTime<Utc> {
        self.last_transition
    }

    pub fn is_registered(&self) -> bool {
        self.status == RegistrationStatus::Registered
    }

    /// Mark the start of a registration attempt
    pub fn begin_attempt(&mut self) {
        self.status = RegistrationStatus::Pending;
        self.last_transition = Utc::now();
    }

    /// Record a successful acknowledgment with the granted expiry
    pub fn confirm(&mut self, granted_expiry: u32) {
        self.status = RegistrationStatus::Registered;
        self.expiry_seconds = granted_expiry;
        self.retry_count = 0;
        self.last_transition = Utc::now();
    }

    /// Record a failed attempt
    pub fn fail(&mut self) {
        self.status = RegistrationStatus::Failed;
        self.retry_count += 1;
        self.last_transition = Utc::now();
    }

    /// Delay until the next registration attempt.
    ///
    /// Registered: renew at half the granted expiry. Anything else: the
    /// fixed retry interval, regardless of how many attempts failed.
    pub fn next_attempt_delay(&self, retry_interval: Duration) -> Duration {
        match self.status {
            RegistrationStatus::Registered => {
                Duration::from_secs(u64::from(self.expiry_seconds) / 2)
            }
            _ => retry_interval,
        }
    }
}

impl Default for RegistrationState {
    fn default() -> Self {
        Self::new()
    }
}
