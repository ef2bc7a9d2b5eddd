//! Agent-platform call-admission client

use crate::application::ports::{AgentCallRegistration, AgentCallRequest, AgentPlatformClient};
use crate::config::AgentConfig;
use crate::domain::shared::{DomainError, Result};
use async_trait::async_trait;
use reqwest::Client;

/// HTTP client for the agent platform's phone-call registration API
#[derive(Clone)]
pub struct HttpAgentPlatform {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpAgentPlatform {
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl AgentPlatformClient for HttpAgentPlatform {
    async fn register_call(&self, request: AgentCallRequest) -> Result<AgentCallRegistration> {
        let response = self
            .client
            .post(format!("{}/v2/register-phone-call", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| DomainError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::AdmissionRejected(format!(
                "{}: {}",
                status, body
            )));
        }

        response
            .json::<AgentCallRegistration>()
            .await
            .map_err(|e| DomainError::AdmissionRejected(format!("unreadable response: {}", e)))
    }
}
