//! Messenger delivery client (Graph-style send API)

use crate::application::ports::MessengerClient;
use crate::config::MessengerConfig;
use crate::domain::shared::{DomainError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

const MESSAGING_TYPE: &str = "MESSAGE_TAG";
const MESSAGE_TAG: &str = "ACCOUNT_UPDATE";

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    recipient: RecipientRef<'a>,
    messaging_type: &'a str,
    tag: &'a str,
    message: MessageBody<'a>,
    access_token: &'a str,
}

#[derive(Serialize)]
struct RecipientRef<'a> {
    id: &'a str,
}

#[derive(Serialize)]
struct MessageBody<'a> {
    text: &'a str,
}

/// HTTP client for the page-messages send endpoint
#[derive(Clone)]
pub struct GraphMessengerClient {
    client: Client,
    messages_url: String,
    access_token: String,
}

impl GraphMessengerClient {
    pub fn new(config: &MessengerConfig) -> Self {
        Self {
            client: Client::new(),
            messages_url: format!(
                "{}/{}/{}/messages",
                config.api_base.trim_end_matches('/'),
                config.api_version,
                config.page_id
            ),
            access_token: config.access_token.clone(),
        }
    }
}

#[async_trait]
impl MessengerClient for GraphMessengerClient {
    async fn send_message(&self, recipient_id: &str, text: &str) -> Result<()> {
        let request = SendMessageRequest {
            recipient: RecipientRef { id: recipient_id },
            messaging_type: MESSAGING_TYPE,
            tag: MESSAGE_TAG,
            message: MessageBody { text },
            access_token: &self.access_token,
        };

        let response = self
            .client
            .post(&self.messages_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| DomainError::NotificationFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::NotificationFailed(format!(
                "{}: {}",
                status, body
            )));
        }
        Ok(())
    }
}
