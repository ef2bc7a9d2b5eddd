//! Signaling gateway over the rsipstack SIP stack
//!
//! Owns the SIP endpoint: keeps the trunk registration transaction state,
//! turns incoming INVITEs into `InboundCall`s for the orchestrator, routes
//! in-dialog requests to their dialogs, and performs the two-leg bridge.

use super::legs::{AgentLeg, TrunkLeg};
use crate::application::ports::{BridgedCall, InboundCall, RegistrationGrant, SignalingPort};
use crate::config::TrunkConfig;
use crate::domain::shared::{DomainError, Result};
use async_trait::async_trait;
use rsip::headers::UntypedHeader;
use rsip::prelude::HeadersExt;
use rsipstack::dialog::authenticate::Credential;
use rsipstack::dialog::dialog_layer::DialogLayer;
use rsipstack::dialog::invitation::InviteOption;
use rsipstack::dialog::registration::Registration;
use rsipstack::dialog::server_dialog::ServerInviteDialog;
use rsipstack::dialog::DialogId;
use rsipstack::transaction::transaction::Transaction;
use rsipstack::transport::udp::UdpConnection;
use rsipstack::transport::TransportLayer;
use rsipstack::EndpointBuilder;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct RsipstackGateway {
    dialog_layer: Arc<DialogLayer>,
    registration: Mutex<Registration>,
    registrar_uri: rsip::Uri,
    contact_uri: rsip::Uri,
    register_expiry: u32,
    /// Call-setup transactions awaiting an admission decision, by token
    pending: Mutex<HashMap<String, Transaction>>,
    /// Server dialogs created for a bridge attempt but not yet answered
    unanswered: Mutex<HashMap<String, ServerInviteDialog>>,
}

impl RsipstackGateway {
    /// Bind the SIP endpoint and start serving.
    ///
    /// Returns the gateway plus the channel inbound call-setup requests are
    /// delivered on.
    pub async fn start(
        config: &TrunkConfig,
        cancel: CancellationToken,
    ) -> Result<(Arc<Self>, mpsc::Receiver<InboundCall>)> {
        let bind_addr: SocketAddr = format!("{}:{}", config.bind_address, config.bind_port)
            .parse()
            .map_err(|e| DomainError::Configuration(format!("invalid bind address: {}", e)))?;

        let transport_layer = TransportLayer::new(cancel.child_token());
        let connection = UdpConnection::create_connection(bind_addr, None, Some(cancel.child_token()))
            .await
            .map_err(|e| DomainError::Transport(e.to_string()))?;
        transport_layer.add_transport(connection.into());

        let endpoint = EndpointBuilder::new()
            .with_user_agent(concat!("trunklink/", env!("CARGO_PKG_VERSION")))
            .with_cancel_token(cancel.child_token())
            .with_transport_layer(transport_layer)
            .build();

        let mut incoming = endpoint
            .incoming_transactions()
            .map_err(|e| DomainError::Transport(e.to_string()))?;
        let endpoint_inner = endpoint.inner.clone();
        tokio::spawn(async move {
            endpoint.inner.serve().await.ok();
        });
        info!(%bind_addr, "SIP endpoint serving");

        let credential = Credential {
            username: config.username.clone(),
            password: config.password.clone(),
            realm: Some(config.realm.clone()),
        };
        let registrar_uri =
            rsip::Uri::try_from(format!("sip:{}:{}", config.provider_host, config.provider_port).as_str())
                .map_err(|e| DomainError::Configuration(format!("invalid provider address: {}", e)))?;
        let contact_uri = rsip::Uri::try_from(
            format!(
                "sip:{}@{}:{}",
                config.username,
                config.contact_host(),
                config.bind_port
            )
            .as_str(),
        )
        .map_err(|e| DomainError::Configuration(format!("invalid contact address: {}", e)))?;

        let gateway = Arc::new(Self {
            dialog_layer: Arc::new(DialogLayer::new(endpoint_inner.clone())),
            registration: Mutex::new(Registration::new(endpoint_inner, Some(credential))),
            registrar_uri,
            contact_uri,
            register_expiry: config.register_expiry,
            pending: Mutex::new(HashMap::new()),
            unanswered: Mutex::new(HashMap::new()),
        });

        let (call_tx, call_rx) = mpsc::channel(64);
        let intake = gateway.clone();
        tokio::spawn(async move {
            loop {
                let transaction = tokio::select! {
                    _ = cancel.cancelled() => break,
                    transaction = incoming.recv() => match transaction {
                        Some(transaction) => transaction,
                        None => break,
                    },
                };
                intake.dispatch(transaction, &call_tx).await;
            }
            debug!("SIP intake loop stopped");
        });

        Ok((gateway, call_rx))
    }

    /// Route one incoming transaction: new INVITEs go to the admission
    /// pipeline, in-dialog requests to their dialog.
    async fn dispatch(&self, mut transaction: Transaction, calls: &mpsc::Sender<InboundCall>) {
        match transaction.original.method {
            rsip::Method::Invite => {
                let Some(source_address) = request_source(&transaction.original) else {
                    warn!("INVITE without a resolvable source, dropping");
                    transaction.reply(rsip::StatusCode::Forbidden).await.ok();
                    return;
                };
                let calling_number = transaction
                    .original
                    .from_header()
                    .ok()
                    .and_then(|from| from.uri().ok())
                    .and_then(|uri| uri.user().map(|user| user.to_string()))
                    .unwrap_or_default();

                let call = InboundCall {
                    token: Uuid::new_v4().to_string(),
                    source_address,
                    calling_number,
                    offer: transaction.original.body.clone(),
                };
                debug!(source = %source_address, caller = %call.calling_number, "incoming call setup");

                self.pending
                    .lock()
                    .await
                    .insert(call.token.clone(), transaction);
                if calls.send(call).await.is_err() {
                    warn!("call intake channel closed, dropping INVITE");
                }
            }
            rsip::Method::Options => {
                transaction.reply(rsip::StatusCode::OK).await.ok();
            }
            _ => {
                // In-dialog request (BYE, ACK, CANCEL, ...): the owning
                // dialog drives its own state, including Terminated events
                match DialogId::try_from(&transaction.original) {
                    Ok(id) => match self.dialog_layer.get_dialog(&id) {
                        Some(mut dialog) => {
                            dialog.handle(&mut transaction).await.ok();
                        }
                        None => {
                            debug!(dialog = %id, "request for unknown dialog");
                            transaction
                                .reply(rsip::StatusCode::CallTransactionDoesNotExist)
                                .await
                                .ok();
                        }
                    },
                    Err(_) => {
                        transaction.reply(rsip::StatusCode::BadRequest).await.ok();
                    }
                }
            }
        }
    }
}

#[async_trait]
impl SignalingPort for RsipstackGateway {
    async fn register(&self) -> Result<RegistrationGrant> {
        let mut registration = self.registration.lock().await;
        let response = registration
            .register(self.registrar_uri.clone(), Some(self.register_expiry))
            .await
            .map_err(|e| DomainError::Transport(e.to_string()))?;

        if response.status_code != rsip::StatusCode::OK {
            return Err(DomainError::AuthRejected(format!(
                "registration answered {}",
                response.status_code
            )));
        }
        Ok(RegistrationGrant {
            expires: registration.expires(),
        })
    }

    async fn reject(&self, call: &InboundCall, code: u16) -> Result<()> {
        let pending = self.pending.lock().await.remove(&call.token);
        if let Some(mut transaction) = pending {
            return transaction
                .reply(reject_status(code))
                .await
                .map_err(|e| DomainError::Transport(e.to_string()));
        }

        let unanswered = self.unanswered.lock().await.remove(&call.token);
        if let Some(dialog) = unanswered {
            dialog.reject(Some(reject_status(code)), None).ok();
        }
        // A final response already went out; nothing left to reject
        Ok(())
    }

    async fn bridge(&self, call: &InboundCall, destination: &str) -> Result<BridgedCall> {
        let callee_uri = rsip::Uri::try_from(destination)
            .map_err(|e| DomainError::BridgeFailed(format!("invalid destination: {}", e)))?;
        let mut transaction = self
            .pending
            .lock()
            .await
            .remove(&call.token)
            .ok_or_else(|| DomainError::BridgeFailed("call setup no longer pending".to_string()))?;

        let caller_uri = match transaction.original.from_header().and_then(|from| from.uri()) {
            Ok(uri) => uri,
            Err(e) => {
                // Keep the setup rejectable; the orchestrator answers it next
                self.pending.lock().await.insert(call.token.clone(), transaction);
                return Err(DomainError::BridgeFailed(format!(
                    "unreadable caller uri: {}",
                    e
                )));
            }
        };

        let (trunk_state_tx, trunk_state_rx) = mpsc::unbounded_channel();
        let trunk_dialog = match self.dialog_layer.get_or_create_server_invite(
            &mut transaction,
            trunk_state_tx,
            None,
            Some(self.contact_uri.clone()),
        ) {
            Ok(dialog) => dialog,
            Err(e) => {
                self.pending.lock().await.insert(call.token.clone(), transaction);
                return Err(DomainError::BridgeFailed(e.to_string()));
            }
        };
        self.unanswered
            .lock()
            .await
            .insert(call.token.clone(), trunk_dialog.clone());

        // The INVITE transaction must keep being driven while leg B rings
        let mut transaction_dialog = trunk_dialog.clone();
        tokio::spawn(async move {
            transaction_dialog.handle(&mut transaction).await.ok();
        });

        let invite_option = InviteOption {
            caller: caller_uri,
            callee: callee_uri,
            contact: self.contact_uri.clone(),
            content_type: Some("application/sdp".to_string()),
            // Leg A's session description carried into leg B unchanged
            offer: Some(call.offer.clone()),
            ..Default::default()
        };
        let (agent_state_tx, agent_state_rx) = mpsc::unbounded_channel();
        let invite_result = self.dialog_layer.do_invite(invite_option, agent_state_tx).await;

        let (agent_dialog, response) = match invite_result {
            Ok(outcome) => outcome,
            Err(e) => return Err(DomainError::BridgeFailed(e.to_string())),
        };
        let response = response
            .ok_or_else(|| DomainError::BridgeFailed("agent leg was rejected".to_string()))?;
        if response.status_code.kind() != rsip::StatusCodeKind::Successful {
            return Err(DomainError::BridgeFailed(format!(
                "agent leg answered {}",
                response.status_code
            )));
        }

        // Answer leg A with leg B's session description
        let answer_headers = vec![rsip::Header::ContentType(
            "application/sdp".to_string().into(),
        )];
        trunk_dialog
            .accept(Some(answer_headers), Some(response.body.clone()))
            .map_err(|e| DomainError::BridgeFailed(e.to_string()))?;
        self.unanswered.lock().await.remove(&call.token);

        Ok(BridgedCall {
            leg_a: TrunkLeg::new(trunk_dialog, trunk_state_rx),
            leg_b: AgentLeg::new(agent_dialog, agent_state_rx),
        })
    }
}

fn reject_status(code: u16) -> rsip::StatusCode {
    match code {
        403 => rsip::StatusCode::Forbidden,
        500 => rsip::StatusCode::ServerInternalError,
        503 => rsip::StatusCode::ServiceUnavailable,
        _ => rsip::StatusCode::ServerInternalError,
    }
}

/// Network origin of a request, from the top Via header.
///
/// Prefers the `received` parameter stamped by intermediaries, then the
/// sent-by host when it is a literal address.
fn request_source(request: &rsip::Request) -> Option<IpAddr> {
    let via = request.via_header().ok()?;
    let value = via.value();

    for param in value.split(';').skip(1) {
        if let Some(received) = param.trim().strip_prefix("received=") {
            if let Ok(address) = received.parse() {
                return Some(address);
            }
        }
    }

    let sent_by = value.split_whitespace().nth(1)?.split(';').next()?;
    let host = sent_by.split(':').next()?;
    host.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invite_with_via(via: &str) -> rsip::Request {
        let raw = format!(
            "INVITE sip:gw@example.com SIP/2.0\r\n\
             Via: {}\r\n\
             Max-Forwards: 70\r\n\
             From: <sip:+48123456789@provider.example>;tag=abc\r\n\
             To: <sip:gw@example.com>\r\n\
             Call-ID: test-call-1\r\n\
             CSeq: 1 INVITE\r\n\
             Content-Length: 0\r\n\r\n",
            via
        );
        rsip::Request::try_from(raw.as_bytes()).expect("INVITE parses")
    }

    #[test]
    fn test_request_source_from_sent_by() {
        let request = invite_with_via("SIP/2.0/UDP 198.51.100.10:5060;branch=z9hG4bK1");
        assert_eq!(
            request_source(&request),
            Some("198.51.100.10".parse().unwrap())
        );
    }

    #[test]
    fn test_request_source_prefers_received_param() {
        let request = invite_with_via(
            "SIP/2.0/UDP gw.provider.example:5060;branch=z9hG4bK1;received=203.0.113.9",
        );
        assert_eq!(
            request_source(&request),
            Some("203.0.113.9".parse().unwrap())
        );
    }

    #[test]
    fn test_request_source_none_for_hostname_sent_by() {
        let request = invite_with_via("SIP/2.0/UDP gw.provider.example;branch=z9hG4bK1");
        assert_eq!(request_source(&request), None);
    }

    #[test]
    fn test_reject_status_mapping() {
        assert_eq!(reject_status(403), rsip::StatusCode::Forbidden);
        assert_eq!(reject_status(503), rsip::StatusCode::ServiceUnavailable);
        assert_eq!(reject_status(500), rsip::StatusCode::ServerInternalError);
        assert_eq!(reject_status(418), rsip::StatusCode::ServerInternalError);
    }
}
