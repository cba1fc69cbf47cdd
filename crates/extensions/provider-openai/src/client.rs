//! Chat-completions client.

use std::time::Duration;

use async_trait::async_trait;
use enhancer_config::OpenAIConfig;
use enhancer_protocols::{CompletionTarget, EnhanceError, EnhanceRequest, TextEnhancer};
use tracing::{debug, warn};

use crate::api::{ApiErrorBody, ApiMessage, ApiRequest, ApiResponse};
use crate::prompt::system_prompt;

const API_REQUEST_FAILED: &str = "API request failed";

/// [`TextEnhancer`] backed by an OpenAI-compatible chat-completions endpoint.
pub struct OpenAIEnhancer {
    api_url: String,
    config: OpenAIConfig,
    client: reqwest::Client,
}

impl OpenAIEnhancer {
    pub fn new(config: OpenAIConfig) -> Self {
        let api_url = config.endpoint.clone();
        Self::with_url(config, api_url)
    }

    /// Create an enhancer against a custom endpoint (for compatible APIs).
    pub fn with_url(config: OpenAIConfig, api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            config,
            client: reqwest::Client::new(),
        }
    }

    fn build_request(&self, target: &CompletionTarget, request: &EnhanceRequest) -> ApiRequest {
        ApiRequest {
            model: target.model.clone(),
            messages: vec![
                ApiMessage::system(system_prompt(request)),
                ApiMessage::user(request.text.clone()),
            ],
            temperature: self.config.temperature,
            max_completion_tokens: self.config.max_completion_tokens,
        }
    }

    async fn send_request(
        &self,
        target: &CompletionTarget,
        api_request: &ApiRequest,
    ) -> Result<reqwest::Response, EnhanceError> {
        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", target.api_key))
            .header("Content-Type", "application/json")
            .timeout(Duration::from_secs(self.config.timeout_seconds))
            .json(api_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EnhanceError::Timeout(self.config.timeout_seconds)
                } else {
                    EnhanceError::Network(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .json::<ApiErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error)
                .and_then(|detail| detail.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| API_REQUEST_FAILED.to_string());
            warn!(status, %message, "Completion request rejected");
            return Err(EnhanceError::Api { status, message });
        }

        Ok(response)
    }
}

#[async_trait]
impl TextEnhancer for OpenAIEnhancer {
    async fn enhance(&self, target: &CompletionTarget, request: &EnhanceRequest) -> Result<String, EnhanceError> {
        let api_request = self.build_request(target, request);
        debug!(model = %api_request.model, chars = request.text.chars().count(), "Sending completion request");

        let response = self.send_request(target, &api_request).await?;
        let body: ApiResponse = response
            .json()
            .await
            .map_err(|e| EnhanceError::InvalidResponse(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| EnhanceError::InvalidResponse("no completion in response".to_string()))
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
