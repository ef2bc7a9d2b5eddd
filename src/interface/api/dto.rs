//! Webhook payload DTOs and the generic API response envelope

use crate::domain::notification::CallAnalysisEvent;
use serde::{Deserialize, Serialize};

/// Generic API response
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// Event posted by the agent platform after a call
#[derive(Debug, Deserialize)]
pub struct CallEventPayload {
    pub event: String,
    #[serde(default)]
    pub call: Option<CallPayload>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CallPayload {
    pub from_number: Option<String>,
    pub recording_url: Option<String>,
    pub call_analysis: Option<CallAnalysisPayload>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CallAnalysisPayload {
    pub call_summary: Option<String>,
    pub custom_analysis_data: Option<CustomAnalysisData>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CustomAnalysisData {
    pub receiver_type: Option<String>,
}

impl CallEventPayload {
    /// The routable analysis event, if this payload is one: only fully
    /// analyzed calls with a caller number qualify.
    pub fn into_analysis_event(self) -> Option<CallAnalysisEvent> {
        if self.event != "call_analyzed" {
            return None;
        }
        let call = self.call?;
        let from_number = call.from_number?;
        let analysis = call.call_analysis.unwrap_or_default();

        Some(CallAnalysisEvent {
            from_number,
            call_summary: analysis.call_summary,
            receiver_type: analysis
                .custom_analysis_data
                .and_then(|data| data.receiver_type),
            recording_url: call.recording_url,
        })
    }
}
