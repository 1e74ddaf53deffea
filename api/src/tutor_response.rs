use pdf_tutor::{ResponseLanguage, Session, Turn};
use serde::Serialize;
use uuid::Uuid;

#[derive(Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub turns: usize,
    pub context_tokens: usize,
}

#[derive(Serialize)]
pub struct DocumentInfo {
    pub source: String,
    pub chars: usize,
}

#[derive(Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub language: ResponseLanguage,
    pub turns: Vec<Turn>,
    pub document: Option<DocumentInfo>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id,
            language: session.language,
            turns: session.transcript().turns().to_vec(),
            document: session.grounding().map(|doc| DocumentInfo {
                source: doc.source.clone(),
                chars: doc.text.chars().count(),
            }),
        }
    }
}

#[derive(Serialize)]
pub struct ChapterList {
    pub language: ResponseLanguage,
    pub chapters: Vec<u32>,
}

#[derive(Serialize)]
pub struct QuestionPaperResponse {
    pub questions: String,
}
