use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use tracing::{error, warn};

use crate::assist::{GenerateRequest, GenerationType, InvoiceAssistant};
use crate::models::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/ai/generate", post(generate))
        .with_state(state)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

/// Takes the raw body so malformed JSON gets the same `{error}` shape as every other failure
async fn generate(State(state): State<AppState>, body: Bytes) -> Response {
    let request: GenerateRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!("Invalid text assist request: {}", e);
            return error_response(StatusCode::BAD_REQUEST, "Invalid request");
        }
    };

    let prompt = match request.prompt.as_deref().map(str::trim) {
        Some(p) if !p.is_empty() => p.to_string(),
        _ => return error_response(StatusCode::BAD_REQUEST, "Prompt is required"),
    };

    let llm = match &state.llm {
        Some(llm) => llm.clone(),
        None => {
            error!("Text assist requested but no LLM provider is configured");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Text assist is not configured");
        }
    };

    let generation_type = GenerationType::parse(request.generation_type.as_deref());
    match InvoiceAssistant::generate(&llm, generation_type, &prompt).await {
        Ok(generated) => (StatusCode::OK, Json(generated)).into_response(),
        Err(e) => {
            error!("Text generation failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
