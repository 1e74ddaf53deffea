use crate::document_processor::{PdfSource, TextExtractor};
use crate::error::{ExtractionError, ModelError};
use crate::models::*;
use crate::query_service::QueryEngine;
use serde::Serialize;
use uuid::Uuid;

/// One conversation: its transcript, its grounding document and the
/// language answers should come back in.
///
/// Not safe for concurrent asks; callers hold it behind a lock.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: Uuid,
    pub language: ResponseLanguage,
    transcript: Transcript,
    grounding: Option<GroundingDocument>,
}

impl Session {
    pub fn new(language: ResponseLanguage) -> Self {
        Self {
            id: Uuid::new_v4(),
            language,
            transcript: Transcript::new(),
            grounding: None,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn grounding(&self) -> Option<&GroundingDocument> {
        self.grounding.as_ref()
    }

    pub fn set_grounding(&mut self, document: GroundingDocument) {
        log::info!(
            "Session {}: grounding set from {} ({} chars)",
            self.id,
            document.source,
            document.text.len()
        );
        self.grounding = Some(document);
    }

    pub fn clear_grounding(&mut self) {
        self.grounding = None;
    }

    /// Extracts `source` and makes it the session's grounding document.
    pub fn load_document(
        &mut self,
        extractor: &dyn TextExtractor,
        source: &PdfSource,
    ) -> Result<&GroundingDocument, ExtractionError> {
        let text = extractor.extract_source(source)?;
        let document = GroundingDocument::new(source.name(), text);
        log::info!(
            "Session {}: grounding loaded from {} ({} chars)",
            self.id,
            document.source,
            document.text.len()
        );
        Ok(self.grounding.insert(document))
    }

    pub async fn ask(&mut self, engine: &QueryEngine, question: &str) -> Result<String, ModelError> {
        let grounding = self.grounding.as_ref().map(|doc| doc.text.as_str());
        engine
            .ask(question, &mut self.transcript, self.language, grounding)
            .await
    }

    /// Empties the transcript and drops the grounding document.
    pub fn reset(&mut self) {
        log::info!("Session {}: reset", self.id);
        self.transcript.clear();
        self.grounding = None;
    }
}
