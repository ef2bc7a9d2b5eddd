//! Post-call notification routing policy
//!
//! Maps a completed-call analysis event onto messenger recipients. The
//! recipient directory is a single tag-keyed map (label and messenger id
//! together, so the two can never drift apart) loaded once at startup.

use serde::Deserialize;
use std::collections::HashMap;

/// The distinguished tag that always receives a copy
pub const MANAGER_TAG: &str = "event_manager";

/// Body text used when the analysis carried no summary
pub const SUMMARY_PLACEHOLDER: &str = "Brak podsumowania";

/// A completed-call analysis event, consumed exactly once
#[derive(Debug, Clone, Deserialize)]
pub struct CallAnalysisEvent {
    pub from_number: String,
    pub call_summary: Option<String>,
    pub receiver_type: Option<String>,
    pub recording_url: Option<String>,
}

/// A messenger recipient: display label plus platform id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub label: String,
    pub id: String,
}

/// Static tag-to-recipient mapping, read-only after startup
#[derive(Debug, Clone, Default)]
pub struct RecipientDirectory {
    entries: HashMap<String, Recipient>,
}

impl RecipientDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: impl Into<String>, label: impl Into<String>, id: impl Into<String>) {
        self.entries.insert(
            tag.into(),
            Recipient {
                label: label.into(),
                id: id.into(),
            },
        );
    }

    pub fn resolve(&self, tag: &str) -> Option<&Recipient> {
        self.entries.get(tag)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Recipients a message for `tag` goes to, primary first.
    ///
    /// Unknown tags resolve to nothing. Any resolved tag other than the
    /// manager tag gets the manager CC'd with the same body.
    pub fn deliveries(&self, tag: &str) -> Vec<&Recipient> {
        let Some(primary) = self.resolve(tag) else {
            return Vec::new();
        };
        let mut recipients = vec![primary];
        if tag != MANAGER_TAG {
            if let Some(manager) = self.resolve(MANAGER_TAG) {
                recipients.push(manager);
            }
        }
        recipients
    }
}

/// Compose the notification body sent to every recipient of an event
pub fn compose_notification(event: &CallAnalysisEvent, recipient_label: &str) -> String {
    let summary = event.call_summary.as_deref().unwrap_or(SUMMARY_PLACEHOLDER);
    let recording = event.recording_url.as_deref().unwrap_or("");
    format!(
        "📞 Numer: {}\n🏢 Odbiorca: {}\n📝 Podsumowanie: {}\n\n▶️ Nagranie: {}",
        event.from_number, recipient_label, summary, recording
    )
}
