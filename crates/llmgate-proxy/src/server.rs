//! Axum HTTP server for the OpenAI-compatible gateway.
//!
//! `serve()` runs the router on a pre-bound `TcpListener` (bound by the
//! startup driver) until the cancellation token fires.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use bytes::Bytes;
use llmgate_core::{InferenceEngine, build_prompt};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::assemble::assemble_response;
use crate::error::GatewayError;
use crate::models::{ChatCompletionRequest, ChatCompletionResponse, ErrorBody, ModelsResponse};

/// Shared application state: the process-wide engine and the served model.
#[derive(Clone)]
pub struct AppState {
    engine: Arc<dyn InferenceEngine>,
    model_id: Arc<str>,
}

impl AppState {
    pub fn new(engine: Arc<dyn InferenceEngine>, model_id: impl Into<Arc<str>>) -> Self {
        Self {
            engine,
            model_id: model_id.into(),
        }
    }
}

/// Build the gateway router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/v1/models", get(list_models))
        .route("/v1/chat/completions", post(chat_completions))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the gateway on a pre-bound listener until `cancel` is triggered.
///
/// In-flight requests are drained before returning.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    info!(
        model = %state.model_id,
        device = %state.engine.device(),
        "Gateway listening on http://{addr}"
    );

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await?;

    info!("Gateway server shut down");
    Ok(())
}

/// Liveness only: reports healthy whenever the listener is bound.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok"
    }))
}

async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    Json(ModelsResponse::single(&state.model_id))
}

/// Translate, generate, assemble.
///
/// The engine call runs on its own task so a client disconnect does not
/// abandon a generation that holds the engine.
async fn chat_completions(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ChatCompletionResponse>, GatewayError> {
    let request: ChatCompletionRequest =
        serde_json::from_slice(&body).map_err(|e| GatewayError::MalformedBody(e.to_string()))?;
    request.validate().map_err(GatewayError::Validation)?;

    let prompt = build_prompt(&request.chat_messages());
    let params = request.sampling_params();
    debug!(
        messages = request.messages.len(),
        max_tokens = params.max_tokens,
        stop = params.stop.len(),
        "Processing chat completion request"
    );

    let engine = Arc::clone(&state.engine);
    let result = tokio::spawn(async move { engine.invoke(&prompt, &params).await })
        .await
        .map_err(|e| GatewayError::Internal(e.to_string()))??;

    info!(
        finish_reason = %result.finish_reason,
        prompt_tokens = result.prompt_tokens,
        completion_tokens = result.completion_tokens,
        "Chat completion finished"
    );

    let model = if request.model.is_empty() {
        state.model_id.as_ref()
    } else {
        request.model.as_str()
    };
    Ok(Json(assemble_response(model, result)))
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            detail: "Not Found".to_string(),
        }),
    )
}
