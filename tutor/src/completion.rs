use crate::config::{Config, Provider};
use crate::error::ModelError;
use crate::gemini_service::GeminiService;
use crate::models::ChatMessage;
use crate::openai_service::OpenAiService;
use async_trait::async_trait;
use std::sync::Arc;

/// A language model that maps an ordered message list to one answer.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Returns the text of the first candidate completion.
    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<String, ModelError>;
}

/// Builds the backend selected by `config.provider`.
pub fn backend_from_config(config: &Config) -> Result<Arc<dyn CompletionBackend>, ModelError> {
    let backend: Arc<dyn CompletionBackend> = match config.provider {
        Provider::OpenAi => Arc::new(OpenAiService::new(
            &config.base_url,
            &config.api_key,
            config.request_timeout,
        )?),
        Provider::Gemini => Arc::new(GeminiService::new(
            &config.base_url,
            &config.api_key,
            config.request_timeout,
        )?),
    };
    Ok(backend)
}
