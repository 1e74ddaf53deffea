pub mod completion;
pub mod config;
pub mod document_processor;
pub mod error;
pub mod export;
pub mod extraction_cache;
pub mod gemini_service;
pub mod library;
pub mod models;
pub mod openai_service;
pub mod prompt;
pub mod query_service;
pub mod question_paper;
pub mod session;

pub use completion::{backend_from_config, CompletionBackend};
pub use config::{Config, Provider};
pub use document_processor::{PdfSource, PdfTextExtractor, TextExtractor};
pub use error::*;
pub use extraction_cache::CachedExtractor;
pub use gemini_service::GeminiService;
pub use library::ChapterLibrary;
pub use models::*;
pub use openai_service::OpenAiService;
pub use prompt::{GroundingStrategy, Persona};
pub use query_service::QueryEngine;
pub use question_paper::{Difficulty, QuestionKind, QuestionPaperRequest};
pub use session::Session;
