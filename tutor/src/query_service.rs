use crate::completion::CompletionBackend;
use crate::error::ModelError;
use crate::models::*;
use crate::prompt::{build_messages, GroundingStrategy, Persona};
use crate::question_paper::{QuestionPaperRequest, QUESTION_SETTER_PERSONA};
use std::sync::Arc;

/// Turns a transcript plus optional document text into one model request and
/// folds the answer back into the transcript.
pub struct QueryEngine {
    backend: Arc<dyn CompletionBackend>,
    model: String,
    persona: Persona,
    strategy: GroundingStrategy,
}

impl QueryEngine {
    pub fn new(backend: Arc<dyn CompletionBackend>, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
            persona: Persona::default(),
            strategy: GroundingStrategy::default(),
        }
    }

    pub fn with_persona(mut self, persona: Persona) -> Self {
        self.persona = persona;
        self
    }

    pub fn with_strategy(mut self, strategy: GroundingStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn strategy(&self) -> GroundingStrategy {
        self.strategy
    }

    /// The message list the next `ask` would send if `transcript` already
    /// held the new question.
    pub fn outbound_messages(
        &self,
        transcript: &Transcript,
        language: ResponseLanguage,
        grounding: Option<&str>,
    ) -> Vec<ChatMessage> {
        build_messages(&self.persona, self.strategy, language, grounding, transcript)
    }

    /// Records `question`, sends the whole conversation and records the answer.
    ///
    /// The question stays in the transcript when the call fails, so the next
    /// successful call re-sends it as prior context.
    pub async fn ask(
        &self,
        question: &str,
        transcript: &mut Transcript,
        language: ResponseLanguage,
        grounding: Option<&str>,
    ) -> Result<String, ModelError> {
        transcript.push(Turn::user(question));

        let messages = self.outbound_messages(transcript, language, grounding);
        log::debug!(
            "Sending {} messages ({} chars) to {}",
            messages.len(),
            messages.iter().map(|m| m.content.len()).sum::<usize>(),
            self.model
        );

        let answer = match self.backend.complete(&self.model, &messages).await {
            Ok(answer) => answer,
            Err(e) => {
                log::warn!("Model call failed, question left unanswered: {}", e);
                return Err(e);
            }
        };

        transcript.push(Turn::assistant(answer.clone()));
        log::info!("Answered turn {} ({} chars)", transcript.len() / 2, answer.len());
        Ok(answer)
    }

    /// One-shot question with no conversation history.
    pub async fn ask_once(
        &self,
        question: &str,
        language: ResponseLanguage,
        grounding: Option<&str>,
    ) -> Result<String, ModelError> {
        let mut scratch = Transcript::new();
        self.ask(question, &mut scratch, language, grounding).await
    }

    /// Produces a question paper with answers from `document_text`.
    pub async fn generate_questions(
        &self,
        request: &QuestionPaperRequest,
        document_text: &str,
    ) -> Result<String, ModelError> {
        let setter = QueryEngine {
            backend: self.backend.clone(),
            model: self.model.clone(),
            persona: Persona::fixed(QUESTION_SETTER_PERSONA),
            strategy: GroundingStrategy::PrefaceUser,
        };
        let question = format!("Question: {}", request.prompt());
        setter.ask_once(&question, request.language, Some(document_text)).await
    }
}
