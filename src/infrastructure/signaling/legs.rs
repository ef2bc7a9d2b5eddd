//! Call-leg handles over rsipstack dialogs
//!
//! Each leg wraps its dialog and a terminated flag fed by the dialog's
//! state channel, so the session supervisor can wait on either side and
//! tear the peer down.

use crate::application::ports::CallLeg;
use crate::domain::shared::{DomainError, Result};
use async_trait::async_trait;
use rsipstack::dialog::client_dialog::ClientInviteDialog;
use rsipstack::dialog::dialog::DialogState;
use rsipstack::dialog::server_dialog::ServerInviteDialog;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::debug;

/// Forward the dialog's state stream into a level-triggered terminated flag
fn watch_termination(mut states: mpsc::UnboundedReceiver<DialogState>) -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        while let Some(state) = states.recv().await {
            if let DialogState::Terminated(..) = state {
                debug!("dialog terminated");
                break;
            }
        }
        // Either Terminated arrived or the dialog went away; both end the leg
        tx.send(true).ok();
    });
    rx
}

async fn wait_flag(rx: &watch::Receiver<bool>) {
    let mut rx = rx.clone();
    while !*rx.borrow() {
        if rx.changed().await.is_err() {
            return;
        }
    }
}

/// Inbound leg from the trunk provider (leg A)
pub struct TrunkLeg {
    dialog: ServerInviteDialog,
    terminated: watch::Receiver<bool>,
}

impl TrunkLeg {
    pub fn new(
        dialog: ServerInviteDialog,
        states: mpsc::UnboundedReceiver<DialogState>,
    ) -> Arc<Self> {
        Arc::new(Self {
            terminated: watch_termination(states),
            dialog,
        })
    }
}

#[async_trait]
impl CallLeg for TrunkLeg {
    fn id(&self) -> String {
        self.dialog.id().to_string()
    }

    async fn hangup(&self) -> Result<()> {
        if self.dialog.state().is_confirmed() {
            self.dialog
                .bye()
                .await
                .map_err(|e| DomainError::Transport(e.to_string()))?;
        }
        Ok(())
    }

    async fn wait_terminated(&self) {
        wait_flag(&self.terminated).await;
    }
}

/// Outbound leg to the agent platform (leg B)
pub struct AgentLeg {
    dialog: ClientInviteDialog,
    terminated: watch::Receiver<bool>,
}

impl AgentLeg {
    pub fn new(
        dialog: ClientInviteDialog,
        states: mpsc::UnboundedReceiver<DialogState>,
    ) -> Arc<Self> {
        Arc::new(Self {
            terminated: watch_termination(states),
            dialog,
        })
    }
}

#[async_trait]
impl CallLeg for AgentLeg {
    fn id(&self) -> String {
        self.dialog.id().to_string()
    }

    async fn hangup(&self) -> Result<()> {
        self.dialog
            .hangup()
            .await
            .map_err(|e| DomainError::Transport(e.to_string()))
    }

    async fn wait_terminated(&self) {
        wait_flag(&self.terminated).await;
    }
}
