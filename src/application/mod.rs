//! Application layer - Use cases and application services
//!
//! Orchestrates the domain state machines through the ports: the
//! registration keepalive loop, the per-call bridge orchestration, and the
//! notification routing.

pub mod bridge_orchestrator;
pub mod notification_router;
pub mod ports;
pub mod registration_manager;

pub use bridge_orchestrator::BridgeOrchestrator;
pub use notification_router::NotificationRouter;
pub use registration_manager::RegistrationManager;
