use crate::{
    chat::{ChatError, ChatInput, ChatSession, Notice},
    config::ModelOption,
    model::GenerationConfig,
    template::{PromptTemplate, TEMPLATES},
    transcript::ChatTurn,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    // one conversation per process; the lock keeps turns sequential
    pub session: Arc<Mutex<ChatSession>>,
    pub models: Arc<Vec<ModelOption>>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(session: ChatSession, models: Vec<ModelOption>) -> Self {
        Self { session: Arc::new(Mutex::new(session)), models: Arc::new(models), metrics: None }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

#[derive(Deserialize)]
pub struct ChatReq {
    pub text: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub credential: Option<String>,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub params: Option<GenerationConfig>,
}

#[derive(Serialize)]
pub struct ChatResp {
    pub transcript: Vec<ChatTurn>,
    pub reply: Option<ChatTurn>,
    pub elapsed_secs: Option<f64>,
    pub error: Option<&'static str>,
    pub notices: Vec<Notice>,
}

#[derive(Serialize)]
pub struct TranscriptResp {
    pub transcript: Vec<ChatTurn>,
}

#[derive(Serialize)]
pub struct SaveResp {
    pub file: String,
    pub notices: Vec<Notice>,
}

#[derive(Debug)]
pub enum ApiError {
    Chat(ChatError),
    Internal(anyhow::Error),
}

impl From<ChatError> for ApiError {
    fn from(e: ChatError) -> Self {
        ApiError::Chat(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Chat(e @ ChatError::Invalid(_)) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
            ApiError::Chat(e @ ChatError::UnknownTemplate(_)) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::Internal(e) => {
                tracing::error!(error = %format!("{e:#}"), "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}"))
            }
        };
        (status, Json(json!({ "error": { "message": message } }))).into_response()
    }
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/chat", post(chat))
        .route("/v1/transcript", get(transcript))
        .route("/v1/clear", post(clear))
        .route("/v1/save", post(save))
        .route("/v1/templates", get(templates))
        .route("/v1/models", get(models))
        .route("/metrics", get(render_metrics))
        .with_state(state)
}

async fn chat(State(state): State<AppState>, Json(req): Json<ChatReq>) -> Result<Json<ChatResp>, ApiError> {
    let mut session = state.session.lock().await;
    let report = session
        .submit(ChatInput {
            text: req.text,
            model: req.model,
            credential: req.credential,
            template: req.template,
            config: req.params,
        })
        .await?;
    Ok(Json(ChatResp {
        transcript: session.transcript().turns().to_vec(),
        reply: report.reply,
        elapsed_secs: report.elapsed.map(|d| d.as_secs_f64()),
        error: report.error.as_ref().map(|e| e.kind()),
        notices: report.notices,
    }))
}

async fn transcript(State(state): State<AppState>) -> Json<TranscriptResp> {
    let session = state.session.lock().await;
    Json(TranscriptResp { transcript: session.transcript().turns().to_vec() })
}

async fn clear(State(state): State<AppState>) -> Json<TranscriptResp> {
    let mut session = state.session.lock().await;
    session.clear();
    Json(TranscriptResp { transcript: session.transcript().turns().to_vec() })
}

async fn save(State(state): State<AppState>) -> Result<Json<SaveResp>, ApiError> {
    let session = state.session.lock().await;
    let path = session.save().map_err(ApiError::Internal)?;
    let file = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let notices = vec![Notice {
        level: crate::chat::NoticeLevel::Info,
        message: format!("Conversation saved as: {file}"),
    }];
    Ok(Json(SaveResp { file, notices }))
}

async fn templates() -> Json<&'static [PromptTemplate]> {
    Json(TEMPLATES)
}

async fn models(State(state): State<AppState>) -> Json<Vec<ModelOption>> {
    Json(state.models.as_ref().clone())
}

async fn render_metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
