mod api_error;
mod app_state;
mod ask_payload;
mod document_request;
mod handlers;
mod tutor_response;

use anyhow::Context;
use app_state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use pdf_tutor::{backend_from_config, ChapterLibrary, Config, Persona, QueryEngine};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/sessions", post(handlers::create_session))
        .route(
            "/sessions/:id",
            get(handlers::get_session).delete(handlers::reset_session),
        )
        .route("/sessions/:id/language", put(handlers::set_language))
        .route("/sessions/:id/document", post(handlers::upload_document))
        .route("/sessions/:id/document/url", post(handlers::document_from_url))
        .route("/sessions/:id/chapter", post(handlers::load_chapter))
        .route("/chapters", get(handlers::list_chapters))
        .route("/sessions/:id/ask", post(handlers::ask))
        .route("/questions", post(handlers::generate_questions))
        .route("/export/pdf", post(handlers::export_pdf))
        .route("/export/docx", post(handlers::export_docx))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = Config::load(Path::new("config.toml")).context("failed to load configuration")?;
    log::info!("Starting tutor API with {:?}", config);

    let backend = backend_from_config(&config)?;
    let engine = QueryEngine::new(backend, config.model.clone())
        .with_persona(Persona::default().with_latex())
        .with_strategy(config.grounding_strategy);
    let library = ChapterLibrary::new(config.library_dir.clone());
    let state = Arc::new(
        AppState::new(engine, config.cache_ttl, library)?.with_session_idle(config.session_idle),
    );

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
    log::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app(state)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use httpmock::prelude::*;
    use pdf_tutor::{ChatMessage, CompletionBackend, ModelError};
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;
    use tower::ServiceExt;

    #[derive(Default)]
    struct FakeModel {
        replies: Mutex<VecDeque<Result<String, ModelError>>>,
        seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    #[async_trait]
    impl CompletionBackend for FakeModel {
        async fn complete(&self, _model: &str, messages: &[ChatMessage]) -> Result<String, ModelError> {
            self.seen.lock().unwrap().push(messages.to_vec());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("answer".to_string()))
        }
    }

    fn state_with(replies: Vec<Result<String, ModelError>>, library: ChapterLibrary) -> (AppState, Arc<FakeModel>) {
        let model = Arc::new(FakeModel {
            replies: Mutex::new(replies.into()),
            seen: Mutex::default(),
        });
        let engine = QueryEngine::new(model.clone(), "gpt-4o-mini");
        let state = AppState::new(engine, Duration::from_secs(3600), library).unwrap();
        (state, model)
    }

    fn setup(replies: Vec<Result<String, ModelError>>) -> (Router, Arc<FakeModel>) {
        let library = ChapterLibrary::new(std::env::temp_dir().join("pdf_tutor_api_no_books"));
        let (state, model) = state_with(replies, library);
        (app(Arc::new(state)), model)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn new_session(app: &Router) -> String {
        let (status, body) = send(app, json_request("POST", "/sessions", json!({ "language": "English" }))).await;
        assert_eq!(status, StatusCode::CREATED);
        let value: Value = serde_json::from_slice(&body).unwrap();
        value["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn ask_records_both_turns() {
        let (app, _) = setup(vec![Ok("a²+b²=c²".to_string())]);
        let id = new_session(&app).await;

        let (status, body) = send(
            &app,
            json_request("POST", &format!("/sessions/{id}/ask"), json!({ "question": "State the theorem." })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["answer"], "a²+b²=c²");
        assert_eq!(value["turns"], 2);
        assert!(value["context_tokens"].as_u64().unwrap() > 0);

        let get = Request::builder().uri(format!("/sessions/{id}")).body(Body::empty()).unwrap();
        let (_, body) = send(&app, get).await;
        let view: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(view["turns"][0]["role"], "user");
        assert_eq!(view["turns"][1]["role"], "assistant");
    }

    #[tokio::test]
    async fn model_failure_is_bad_gateway_and_keeps_question() {
        let (app, model) = setup(vec![Err(ModelError::Timeout)]);
        let id = new_session(&app).await;

        let (status, body) = send(
            &app,
            json_request("POST", &format!("/sessions/{id}/ask"), json!({ "question": "Why?" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], "model_failed");

        send(&app, json_request("POST", &format!("/sessions/{id}/ask"), json!({ "question": "Hello?" }))).await;
        let second = model.seen.lock().unwrap()[1].clone();
        assert!(second.iter().any(|m| m.content == "Why?"));
    }

    #[tokio::test]
    async fn uploaded_document_grounds_later_questions_until_reset() {
        let (app, model) = setup(vec![]);
        let id = new_session(&app).await;
        let pdf = pdf_tutor::export::to_pdf("Integrals measure area").unwrap();

        let upload = Request::builder()
            .method("POST")
            .uri(format!("/sessions/{id}/document"))
            .header("content-type", "application/pdf")
            .body(Body::from(pdf))
            .unwrap();
        let (status, body) = send(&app, upload).await;
        assert_eq!(status, StatusCode::OK);
        let info: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(info["source"], "upload.pdf");

        send(&app, json_request("POST", &format!("/sessions/{id}/ask"), json!({ "question": "q1" }))).await;
        assert!(model.seen.lock().unwrap()[0][0].content.contains("Integrals measure area"));

        let reset = Request::builder()
            .method("DELETE")
            .uri(format!("/sessions/{id}"))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, reset).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let get = Request::builder().uri(format!("/sessions/{id}")).body(Body::empty()).unwrap();
        let (_, body) = send(&app, get).await;
        let view: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(view["turns"].as_array().unwrap().len(), 0);
        assert!(view["document"].is_null());
    }

    #[tokio::test]
    async fn corrupt_upload_is_unprocessable() {
        let (app, _) = setup(vec![]);
        let id = new_session(&app).await;

        let upload = Request::builder()
            .method("POST")
            .uri(format!("/sessions/{id}/document"))
            .body(Body::from("not a pdf"))
            .unwrap();
        let (status, _) = send(&app, upload).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn unknown_session_and_missing_chapter() {
        let (app, _) = setup(vec![]);

        let get = Request::builder()
            .uri(format!("/sessions/{}", uuid::Uuid::new_v4()))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, get).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let id = new_session(&app).await;
        let (status, body) = send(
            &app,
            json_request("POST", &format!("/sessions/{id}/chapter"), json!({ "chapter": 4 })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], "chapter_not_found");

        let (status, _) = send(
            &app,
            json_request("POST", &format!("/sessions/{id}/chapter"), json!({ "chapter": 20 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn question_paper_from_upload() {
        let (app, model) = setup(vec![Ok("1. True or false: ...".to_string())]);
        let pdf = pdf_tutor::export::to_pdf("Probability of an event").unwrap();

        let request = Request::builder()
            .method("POST")
            .uri("/questions?count=5&difficulty=hard&kind=true_false&language=Hindi")
            .body(Body::from(pdf))
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["questions"], "1. True or false: ...");

        let sent = model.seen.lock().unwrap()[0].clone();
        assert!(sent[1].content.contains("Probability of an event"));
        assert!(sent[2].content.contains("in Hindi of True and False with difficulty Hard"));

        let too_many = Request::builder()
            .method("POST")
            .uri("/questions?count=80")
            .body(Body::from("x"))
            .unwrap();
        let (status, _) = send(&app, too_many).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn exports_set_download_headers() {
        let (app, _) = setup(vec![]);

        let response = app
            .clone()
            .oneshot(json_request("POST", "/export/docx", json!({ "text": "Q1\nQ2" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()["content-disposition"]
            .to_str()
            .unwrap()
            .contains("questions_and_answers.docx"));

        let (status, body) = send(&app, json_request("POST", "/export/pdf", json!({ "text": "Q1" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.starts_with(b"%PDF-"));
    }

    #[tokio::test]
    async fn question_is_recorded_as_submitted() {
        let (app, model) = setup(vec![]);
        let id = new_session(&app).await;

        let (status, _) = send(
            &app,
            json_request("POST", &format!("/sessions/{id}/ask"), json!({ "question": "  What is a limit?\n" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(model.seen.lock().unwrap()[0]
            .iter()
            .any(|m| m.content == "  What is a limit?\n"));

        let get = Request::builder().uri(format!("/sessions/{id}")).body(Body::empty()).unwrap();
        let (_, body) = send(&app, get).await;
        let view: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(view["turns"][0]["content"], "  What is a limit?\n");

        let (status, _) = send(
            &app,
            json_request("POST", &format!("/sessions/{id}/ask"), json!({ "question": "   " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn language_accepts_lowercase_and_ui_labels() {
        let (app, _) = setup(vec![]);
        let id = new_session(&app).await;

        for (label, expected) in [("hindi", "Hindi"), ("***English***", "English")] {
            let (status, _) = send(
                &app,
                json_request("PUT", &format!("/sessions/{id}/language"), json!({ "language": label })),
            )
            .await;
            assert_eq!(status, StatusCode::NO_CONTENT);

            let get = Request::builder().uri(format!("/sessions/{id}")).body(Body::empty()).unwrap();
            let (_, body) = send(&app, get).await;
            let view: Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(view["language"], expected);
        }
    }

    #[tokio::test]
    async fn idle_sessions_are_evicted_on_create() {
        let library = ChapterLibrary::new(std::env::temp_dir().join("pdf_tutor_api_no_books"));
        let (state, _) = state_with(vec![], library);
        let state = Arc::new(state.with_session_idle(Duration::ZERO));
        let app = app(state.clone());

        for _ in 0..50 {
            let id = new_session(&app).await;
            let reset = Request::builder()
                .method("DELETE")
                .uri(format!("/sessions/{id}"))
                .body(Body::empty())
                .unwrap();
            let (status, _) = send(&app, reset).await;
            assert_eq!(status, StatusCode::NO_CONTENT);
        }
        assert_eq!(state.session_count().await, 1);
    }

    #[tokio::test]
    async fn active_sessions_are_kept() {
        let library = ChapterLibrary::new(std::env::temp_dir().join("pdf_tutor_api_no_books"));
        let (state, _) = state_with(vec![], library);
        let state = Arc::new(state);
        let app = app(state.clone());

        let first = new_session(&app).await;
        new_session(&app).await;
        assert_eq!(state.session_count().await, 2);

        let get = Request::builder().uri(format!("/sessions/{first}")).body(Body::empty()).unwrap();
        let (status, _) = send(&app, get).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn oversized_download_is_rejected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/chapter.pdf");
                then.status(200).body(vec![b'x'; 64]);
            })
            .await;

        let library = ChapterLibrary::new(std::env::temp_dir().join("pdf_tutor_api_no_books"));
        let (state, _) = state_with(vec![], library);
        let app = app(Arc::new(state.with_max_document_bytes(16)));
        let id = new_session(&app).await;

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                &format!("/sessions/{id}/document/url"),
                json!({ "pdf_url": server.url("/chapter.pdf") }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], "document_too_large");
    }

    #[tokio::test]
    async fn download_within_limit_is_extracted() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/notes.pdf");
                then.status(200).body("not a pdf");
            })
            .await;

        let (app, _) = setup(vec![]);
        let id = new_session(&app).await;

        let (status, _) = send(
            &app,
            json_request(
                "POST",
                &format!("/sessions/{id}/document/url"),
                json!({ "pdf_url": server.url("/notes.pdf") }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn lists_chapters_on_disk() {
        let root = std::env::temp_dir().join(format!("pdf_tutor_api_chapters_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&root);
        std::fs::create_dir_all(root.join("NCERT_class_12_hin")).unwrap();
        std::fs::write(root.join("NCERT_class_12_hin/7.pdf"), b"%PDF-1.5").unwrap();

        let (state, _) = state_with(vec![], ChapterLibrary::new(&root));
        let app = app(Arc::new(state));

        let request = Request::builder().uri("/chapters?language=hindi").body(Body::empty()).unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["language"], "Hindi");
        assert_eq!(value["chapters"], json!([7]));

        let request = Request::builder().uri("/chapters").body(Body::empty()).unwrap();
        let (_, body) = send(&app, request).await;
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["chapters"], json!([]));

        let _ = std::fs::remove_dir_all(&root);
    }
}
