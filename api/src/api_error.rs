use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pdf_tutor::{ExportError, ExtractionError, LibraryError, ModelError};
use serde::Serialize;

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    SessionNotFound,
    Download(String),
    TooLarge { limit: usize },
    Extraction(ExtractionError),
    Model(ModelError),
    Library(LibraryError),
    Export(ExportError),
}

impl From<ExtractionError> for ApiError {
    fn from(err: ExtractionError) -> Self {
        ApiError::Extraction(err)
    }
}

impl From<ModelError> for ApiError {
    fn from(err: ModelError) -> Self {
        ApiError::Model(err)
    }
}

impl From<LibraryError> for ApiError {
    fn from(err: LibraryError) -> Self {
        ApiError::Library(err)
    }
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        ApiError::Export(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, "bad_request", message),
            ApiError::SessionNotFound => (
                StatusCode::NOT_FOUND,
                "session_not_found",
                "No session with that id".to_string(),
            ),
            ApiError::Download(message) => (StatusCode::BAD_GATEWAY, "download_failed", message),
            ApiError::TooLarge { limit } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "document_too_large",
                format!("Document exceeds the {limit} byte limit"),
            ),
            ApiError::Extraction(err) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "extraction_failed", err.to_string())
            }
            ApiError::Model(err) => (StatusCode::BAD_GATEWAY, "model_failed", err.to_string()),
            ApiError::Library(err @ LibraryError::NotFound { .. }) => {
                (StatusCode::NOT_FOUND, "chapter_not_found", err.to_string())
            }
            ApiError::Library(err) => (StatusCode::BAD_REQUEST, "invalid_chapter", err.to_string()),
            ApiError::Export(err) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "export_failed", err.to_string())
            }
        };

        if status.is_server_error() {
            log::error!("{}: {}", error, message);
        }

        (
            status,
            Json(ErrorBody {
                error: error.to_string(),
                message,
            }),
        )
            .into_response()
    }
}
