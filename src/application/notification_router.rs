//! Post-call notification routing
//!
//! Invoked after the webhook has already acknowledged the event source;
//! every failure here is logged and swallowed, never retried, never
//! surfaced upstream.

use super::ports::MessengerClient;
use crate::domain::notification::{compose_notification, CallAnalysisEvent, RecipientDirectory};
use std::sync::Arc;
use tracing::{debug, error, info};

pub struct NotificationRouter {
    directory: RecipientDirectory,
    messenger: Arc<dyn MessengerClient>,
}

impl NotificationRouter {
    pub fn new(directory: RecipientDirectory, messenger: Arc<dyn MessengerClient>) -> Self {
        Self {
            directory,
            messenger,
        }
    }

    /// Send the notification for one analyzed call.
    ///
    /// One body is composed per event and delivered to the resolved
    /// recipient, with the event manager CC'd unless they were the
    /// recipient already. Unknown receiver tags send nothing.
    pub async fn route(&self, event: CallAnalysisEvent) {
        let Some(tag) = event.receiver_type.as_deref() else {
            debug!(caller = %event.from_number, "analysis event without receiver type");
            return;
        };

        let recipients = self.directory.deliveries(tag);
        let Some(primary) = recipients.first() else {
            debug!(tag, "no recipient configured for receiver type");
            return;
        };

        let text = compose_notification(&event, &primary.label);
        for recipient in &recipients {
            match self.messenger.send_message(&recipient.id, &text).await {
                Ok(()) => info!(
                    recipient = %recipient.label,
                    caller = %event.from_number,
                    "notification delivered"
                ),
                Err(e) => error!(
                    recipient = %recipient.label,
                    error = %e,
                    "notification delivery failed"
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::MockMessengerClient;
    use crate::domain::notification::MANAGER_TAG;
    use crate::domain::shared::DomainError;

    fn directory() -> RecipientDirectory {
        let mut directory = RecipientDirectory::new();
        directory.insert(MANAGER_TAG, "Event Manager", "1001");
        directory.insert("recepcja", "Recepcja", "1002");
        directory
    }

    fn event(receiver_type: Option<&str>) -> CallAnalysisEvent {
        CallAnalysisEvent {
            from_number: "+48123456789".to_string(),
            call_summary: Some("Rezerwacja stolika".to_string()),
            receiver_type: receiver_type.map(|s| s.to_string()),
            recording_url: Some("https://recordings.example.com/abc".to_string()),
        }
    }

    #[tokio::test]
    async fn test_reception_event_sends_two_messages() {
        let mut messenger = MockMessengerClient::new();
        messenger
            .expect_send_message()
            .times(1)
            .withf(|id, _| id == "1002")
            .returning(|_, _| Ok(()));
        messenger
            .expect_send_message()
            .times(1)
            .withf(|id, _| id == "1001")
            .returning(|_, _| Ok(()));

        let router = NotificationRouter::new(directory(), Arc::new(messenger));
        router.route(event(Some("recepcja"))).await;
    }

    #[tokio::test]
    async fn test_manager_event_sends_single_message() {
        let mut messenger = MockMessengerClient::new();
        messenger
            .expect_send_message()
            .times(1)
            .withf(|id, _| id == "1001")
            .returning(|_, _| Ok(()));

        let router = NotificationRouter::new(directory(), Arc::new(messenger));
        router.route(event(Some(MANAGER_TAG))).await;
    }

    #[tokio::test]
    async fn test_unknown_tag_sends_nothing() {
        let mut messenger = MockMessengerClient::new();
        messenger.expect_send_message().never();

        let router = NotificationRouter::new(directory(), Arc::new(messenger));
        router.route(event(Some("kuchnia"))).await;
    }

    #[tokio::test]
    async fn test_missing_tag_sends_nothing() {
        let mut messenger = MockMessengerClient::new();
        messenger.expect_send_message().never();

        let router = NotificationRouter::new(directory(), Arc::new(messenger));
        router.route(event(None)).await;
    }

    #[tokio::test]
    async fn test_manager_copy_sent_even_when_first_send_fails() {
        let mut messenger = MockMessengerClient::new();
        messenger
            .expect_send_message()
            .times(1)
            .withf(|id, _| id == "1002")
            .returning(|_, _| Err(DomainError::NotificationFailed("timeout".to_string())));
        messenger
            .expect_send_message()
            .times(1)
            .withf(|id, _| id == "1001")
            .returning(|_, _| Ok(()));

        let router = NotificationRouter::new(directory(), Arc::new(messenger));
        router.route(event(Some("recepcja"))).await;
    }

    #[tokio::test]
    async fn test_same_body_goes_to_both_recipients() {
        let mut messenger = MockMessengerClient::new();
        messenger
            .expect_send_message()
            .times(2)
            .withf(|_, text| {
                text.contains("Recepcja") && text.contains("Rezerwacja stolika")
            })
            .returning(|_, _| Ok(()));

        let router = NotificationRouter::new(directory(), Arc::new(messenger));
        router.route(event(Some("recepcja"))).await;
    }
}
