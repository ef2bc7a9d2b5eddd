use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};
use trunklink::application::ports::SignalingPort;
use trunklink::application::{BridgeOrchestrator, NotificationRouter, RegistrationManager};
use trunklink::config::Config;
use trunklink::domain::admission::CallAdmissionGate;
use trunklink::infrastructure::agent::HttpAgentPlatform;
use trunklink::infrastructure::messenger::GraphMessengerClient;
use trunklink::infrastructure::signaling::RsipstackGateway;
use trunklink::interface::api::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("Starting trunklink");

    // Load configuration
    let config = Config::from_env()?;
    let cancel = CancellationToken::new();

    // Start the SIP endpoint
    let (gateway, mut inbound_calls) =
        RsipstackGateway::start(&config.trunk, cancel.child_token()).await?;
    let signaling: Arc<dyn SignalingPort> = gateway.clone();

    // Keep the trunk registration alive
    let registration_manager = RegistrationManager::new(
        signaling.clone(),
        Duration::from_secs(config.trunk.retry_interval_secs),
    );
    tokio::spawn(registration_manager.run());
    info!("Registration manager started");

    // Bridge admitted inbound calls to the agent platform
    let gate = CallAdmissionGate::new(config.trunk.trusted_address()?);
    let agent_platform = Arc::new(HttpAgentPlatform::new(&config.agent));
    let orchestrator = Arc::new(BridgeOrchestrator::new(
        gate,
        signaling,
        agent_platform,
        &config.agent,
    ));
    tokio::spawn(async move {
        while let Some(call) = inbound_calls.recv().await {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move {
                orchestrator.handle_call(call).await;
            });
        }
    });
    info!("Call bridge orchestrator started");

    // Route post-call analysis events to messenger recipients
    let messenger = Arc::new(GraphMessengerClient::new(&config.messenger));
    let notifications = Arc::new(NotificationRouter::new(
        config.recipient_directory(),
        messenger,
    ));
    let app = build_router(AppState { notifications });
    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))
            .await?;
    info!(
        "HTTP server listening on {}:{}",
        config.server.host, config.server.port
    );
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("HTTP server failed");
    });

    // Keep the process running
    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");
    cancel.cancel();

    Ok(())
}
