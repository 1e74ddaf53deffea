use crate::api_error::ApiError;
use anyhow::Result;
use pdf_tutor::{
    CachedExtractor, ChapterLibrary, ChatMessage, PdfTextExtractor, QueryEngine, ResponseLanguage,
    Session,
};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError};
use std::time::{Duration, Instant};
use tiktoken_rs::CoreBPE;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

pub type SessionHandle = Arc<Mutex<Session>>;

const DEFAULT_SESSION_IDLE: Duration = Duration::from_secs(24 * 60 * 60);

struct SessionSlot {
    handle: SessionHandle,
    last_used: std::sync::Mutex<Instant>,
}

impl SessionSlot {
    fn touch(&self) {
        *self.last_used.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    fn idle_for(&self) -> Duration {
        self.last_used
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed()
    }
}

/// Shared service state. Each session sits behind its own mutex so asks on
/// one session are serialized while other sessions proceed.
///
/// Sessions untouched for longer than `session_idle` are evicted the next
/// time a session is created.
pub struct AppState {
    sessions: RwLock<HashMap<Uuid, SessionSlot>>,
    session_idle: Duration,
    pub engine: QueryEngine,
    pub extractor: CachedExtractor<PdfTextExtractor>,
    pub library: ChapterLibrary,
    pub http: Client,
    pub max_document_bytes: usize,
    tokenizer: CoreBPE,
}

impl AppState {
    pub fn new(engine: QueryEngine, cache_ttl: Duration, library: ChapterLibrary) -> Result<Self> {
        let tokenizer = tiktoken_rs::cl100k_base()?;

        Ok(Self {
            sessions: RwLock::new(HashMap::new()),
            session_idle: DEFAULT_SESSION_IDLE,
            engine,
            extractor: CachedExtractor::new(PdfTextExtractor::new(), cache_ttl),
            library,
            http: Client::new(),
            max_document_bytes: crate::MAX_UPLOAD_BYTES,
            tokenizer,
        })
    }

    pub fn with_session_idle(mut self, idle: Duration) -> Self {
        self.session_idle = idle;
        self
    }

    pub fn with_max_document_bytes(mut self, limit: usize) -> Self {
        self.max_document_bytes = limit;
        self
    }

    pub async fn create_session(&self, language: ResponseLanguage) -> Uuid {
        self.evict_idle().await;

        let session = Session::new(language);
        let id = session.id;
        let slot = SessionSlot {
            handle: Arc::new(Mutex::new(session)),
            last_used: std::sync::Mutex::new(Instant::now()),
        };
        self.sessions.write().await.insert(id, slot);
        log::info!(
            "Created session {} ({}), {} active",
            id,
            language,
            self.session_count().await
        );
        id
    }

    pub async fn session(&self, id: Uuid) -> Result<SessionHandle, ApiError> {
        let sessions = self.sessions.read().await;
        let slot = sessions.get(&id).ok_or(ApiError::SessionNotFound)?;
        slot.touch();
        Ok(slot.handle.clone())
    }

    /// Drops sessions idle past the limit along with expired cache entries.
    /// Returns how many sessions were removed.
    pub async fn evict_idle(&self) -> usize {
        let idle = self.session_idle;
        let removed = {
            let mut sessions = self.sessions.write().await;
            let before = sessions.len();
            sessions.retain(|_, slot| slot.idle_for() < idle);
            before - sessions.len()
        };
        let purged = self.extractor.purge_expired();
        if removed > 0 || purged > 0 {
            log::info!("Evicted {} idle sessions and {} cached extractions", removed, purged);
        }
        removed
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Rough token count of `messages` as the model would see them.
    pub fn count_tokens(&self, messages: &[ChatMessage]) -> usize {
        messages
            .iter()
            .map(|m| self.tokenizer.encode_with_special_tokens(&m.content).len())
            .sum()
    }

    /// Size of the next request for `session` before the new question.
    pub fn context_tokens(&self, session: &Session) -> usize {
        let grounding = session.grounding().map(|doc| doc.text.as_str());
        let messages = self
            .engine
            .outbound_messages(session.transcript(), session.language, grounding);
        self.count_tokens(&messages)
    }
}
