use crate::completion::CompletionBackend;
use crate::error::ModelError;
use crate::models::*;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

pub struct GeminiService {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GeminiService {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, ModelError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn build_request(&self, messages: &[ChatMessage]) -> GeminiRequest {
        let mut system_parts = Vec::new();
        let mut contents = Vec::new();

        for message in messages {
            let part = GeminiPart { text: message.content.clone() };
            match message.role {
                Speaker::System => system_parts.push(part),
                Speaker::User => contents.push(GeminiContent {
                    role: Some("user".to_string()),
                    parts: vec![part],
                }),
                Speaker::Assistant => contents.push(GeminiContent {
                    role: Some("model".to_string()),
                    parts: vec![part],
                }),
            }
        }

        GeminiRequest {
            system_instruction: (!system_parts.is_empty()).then(|| GeminiContent {
                role: None,
                parts: system_parts,
            }),
            contents,
        }
    }
}

#[async_trait]
impl CompletionBackend for GeminiService {
    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<String, ModelError> {
        let request = self.build_request(messages);

        let url = format!("{}/models/{}:generateContent", self.base_url, model);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Provider { status, body });
        }

        let body = response.text().await?;
        let gemini_response: GeminiResponse = serde_json::from_str(&body)
            .map_err(|e| ModelError::MalformedResponse(e.to_string()))?;

        gemini_response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or(ModelError::EmptyResponse)
    }
}
