use crate::error::{AppError, Result};
use crate::model::{CreateUrlRequest, CreateUrlResponse, MessageResponse};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use keyspan_core::ShortCode;
use keyspan_shortener::validate_long_url;
use tracing::{debug, info};

fn parse_short_code(raw: String) -> Result<ShortCode> {
    ShortCode::new(raw).map_err(|_| AppError::BadRequest("invalid short url".to_string()))
}

pub async fn create_url_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateUrlRequest>, JsonRejection>,
) -> Result<Json<CreateUrlResponse>> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    validate_long_url(&request.long_url)?;

    let code = state
        .shortener()
        .create(&state.request_context(), &request.long_url)
        .await?;
    info!(code = %code, "short url created");

    Ok(Json(CreateUrlResponse {
        short_url: code.to_url(state.base_url()),
        short_code: code.to_string(),
    }))
}

/// Answers with `301 Moved Permanently` to the stored long URL.
pub async fn get_url_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
) -> Result<Response> {
    let code = parse_short_code(short_code)?;
    let long_url = state
        .shortener()
        .find(&state.request_context(), &code)
        .await?;
    debug!(code = %code, "redirecting");

    Ok((StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, long_url)]).into_response())
}

pub async fn delete_url_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>> {
    let code = parse_short_code(short_code)?;
    state
        .shortener()
        .delete(&state.request_context(), &code)
        .await?;
    info!(code = %code, "short url deleted");

    Ok(Json(MessageResponse::new("url deleted")))
}
