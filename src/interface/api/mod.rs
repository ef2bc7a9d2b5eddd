//! REST API surface

pub mod dto;
pub mod router;
pub mod webhook_handler;

pub use dto::ApiResponse;
pub use router::build_router;
pub use webhook_handler::AppState;
