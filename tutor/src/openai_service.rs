use crate::completion::CompletionBackend;
use crate::error::ModelError;
use crate::models::*;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// OpenAI-compatible chat completions client.
pub struct OpenAiService {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenAiService {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, ModelError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl CompletionBackend for OpenAiService {
    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<String, ModelError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = OpenAiRequest { model, messages };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Provider { status: status.as_u16(), body });
        }

        let body = response.text().await?;
        let completion: OpenAiResponse = serde_json::from_str(&body)
            .map_err(|e| ModelError::MalformedResponse(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(ModelError::EmptyResponse)
    }
}
