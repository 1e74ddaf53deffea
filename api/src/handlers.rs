use crate::api_error::ApiError;
use crate::app_state::AppState;
use crate::ask_payload::*;
use crate::document_request::DocumentUrlRequest;
use crate::tutor_response::*;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use pdf_tutor::{
    export, ExtractionError, GroundingDocument, PdfSource, QuestionPaperRequest, TextExtractor,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

pub async fn create_session(
    State(state): State<Arc<AppState>>,
    payload: Option<Json<NewSessionPayload>>,
) -> impl IntoResponse {
    let language = payload.map(|Json(p)| p.language).unwrap_or_default();
    let id = state.create_session(language).await;
    (StatusCode::CREATED, Json(json!({ "id": id, "language": language })))
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let handle = state.session(id).await?;
    let session = handle.lock().await;
    Ok(Json(SessionView::from(&*session)))
}

pub async fn reset_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let handle = state.session(id).await?;
    handle.lock().await.reset();
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_language(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<LanguagePayload>,
) -> Result<StatusCode, ApiError> {
    let handle = state.session(id).await?;
    handle.lock().await.language = payload.language;
    Ok(StatusCode::NO_CONTENT)
}

/// Raw PDF body becomes the session's grounding document.
pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("request body must be a PDF".to_string()));
    }
    let source = PdfSource::bytes("upload.pdf", body.to_vec());
    load_into_session(state, id, source).await
}

pub async fn document_from_url(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DocumentUrlRequest>,
) -> Result<impl IntoResponse, ApiError> {
    log::info!("Downloading PDF from {}", payload.pdf_url);

    let mut response = state
        .http
        .get(&payload.pdf_url)
        .send()
        .await
        .map_err(|e| ApiError::Download(e.to_string()))?;
    if !response.status().is_success() {
        return Err(ApiError::Download(format!(
            "{} returned {}",
            payload.pdf_url,
            response.status()
        )));
    }

    let limit = state.max_document_bytes;
    if let Some(length) = response.content_length() {
        if length > limit as u64 {
            return Err(ApiError::TooLarge { limit });
        }
    }
    // Content-Length may be absent or wrong, so the cap is enforced per chunk too.
    let mut bytes = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| ApiError::Download(e.to_string()))?
    {
        if bytes.len() + chunk.len() > limit {
            return Err(ApiError::TooLarge { limit });
        }
        bytes.extend_from_slice(&chunk);
    }

    let name = payload
        .pdf_url
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or("download.pdf")
        .to_string();
    load_into_session(state, id, PdfSource::bytes(name, bytes)).await
}

pub async fn list_chapters(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChapterListQuery>,
) -> Json<ChapterList> {
    Json(ChapterList {
        language: query.language,
        chapters: state.library.available(query.language),
    })
}

pub async fn load_chapter(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChapterPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let language = state.session(id).await?.lock().await.language;
    let source = state.library.load(payload.chapter, language)?;
    load_into_session(state, id, source).await
}

async fn load_into_session(
    state: Arc<AppState>,
    id: Uuid,
    source: PdfSource,
) -> Result<Json<DocumentInfo>, ApiError> {
    let handle = state.session(id).await?;

    let name = source.name();
    let worker = state.clone();
    let text = tokio::task::spawn_blocking(move || worker.extractor.extract_source(&source))
        .await
        .map_err(|e| ApiError::Extraction(ExtractionError::Malformed(e.to_string())))??;

    let chars = text.chars().count();
    handle
        .lock()
        .await
        .set_grounding(GroundingDocument::new(name.clone(), text));

    Ok(Json(DocumentInfo { source: name, chars }))
}

pub async fn ask(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AskPayload>,
) -> Result<Json<AskResponse>, ApiError> {
    if payload.question.trim().is_empty() {
        return Err(ApiError::BadRequest("question must not be empty".to_string()));
    }

    let handle = state.session(id).await?;
    let mut session = handle.lock().await;

    let answer = session.ask(&state.engine, &payload.question).await?;

    Ok(Json(AskResponse {
        answer,
        turns: session.transcript().len(),
        context_tokens: state.context_tokens(&session),
    }))
}

pub async fn generate_questions(
    State(state): State<Arc<AppState>>,
    Query(request): Query<QuestionPaperRequest>,
    body: Bytes,
) -> Result<Json<QuestionPaperResponse>, ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    if body.is_empty() {
        return Err(ApiError::BadRequest("request body must be a PDF".to_string()));
    }

    let worker = state.clone();
    let document_text = tokio::task::spawn_blocking(move || worker.extractor.extract(&body))
        .await
        .map_err(|e| ApiError::Extraction(ExtractionError::Malformed(e.to_string())))??;

    let questions = state
        .engine
        .generate_questions(&request, &document_text)
        .await?;

    Ok(Json(QuestionPaperResponse { questions }))
}

pub async fn export_pdf(Json(payload): Json<ExportPayload>) -> Result<impl IntoResponse, ApiError> {
    let bytes = export::to_pdf(&payload.text)?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"questions_and_answers.pdf\"",
            ),
        ],
        bytes,
    ))
}

pub async fn export_docx(Json(payload): Json<ExportPayload>) -> Result<impl IntoResponse, ApiError> {
    let bytes = export::to_docx(&payload.text)?;
    Ok((
        [
            (
                header::CONTENT_TYPE,
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            ),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"questions_and_answers.docx\"",
            ),
        ],
        bytes,
    ))
}
