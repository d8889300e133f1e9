//! Axum Handlers for the Bot Front End
//!
//! Each handler converts one inbound HTTP request into an engine event for
//! the user named by the `x-user-id` header, and renders the engine's
//! replies back as JSON. It uses `utoipa` doc comments to generate OpenAPI
//! documentation.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use parley_core::{EngineError, Event};
use std::sync::Arc;
use tracing::error;

use crate::{
    models::{
        ButtonPayload, CommandPayload, ErrorResponse, ReplyBody, TextPayload, VoicePayload,
    },
    state::AppState,
};

pub enum ApiError {
    BadRequest(String),
    UnknownAction(String),
    InternalServerError(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { message })).into_response()
            }
            ApiError::UnknownAction(payload) => {
                let message = format!("Unrecognized action payload: '{payload}'");
                (StatusCode::UNPROCESSABLE_ENTITY, Json(ErrorResponse { message }))
                    .into_response()
            }
            ApiError::InternalServerError(err) => {
                error!("Internal Server Error: {:?}", err);
                let message = "An internal server error occurred.".to_string();
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse { message }),
                )
                    .into_response()
            }
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::UnknownAction(payload) => Self::UnknownAction(payload),
        }
    }
}

fn user_id(headers: &HeaderMap) -> Result<u64, ApiError> {
    headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("x-user-id header is required".to_string()))?
        .parse::<u64>()
        .map_err(|_| ApiError::BadRequest("x-user-id must be a numeric user id".to_string()))
}

fn render(replies: Vec<parley_core::Reply>) -> Json<Vec<ReplyBody>> {
    Json(replies.into_iter().map(ReplyBody::from).collect())
}

/// Liveness probe for the hosting platform.
#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = 200, description = "Service is up")
    )
)]
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Dispatch a slash command.
#[utoipa::path(
    post,
    path = "/events/command",
    request_body = CommandPayload,
    responses(
        (status = 200, description = "Replies to present to the user", body = [ReplyBody]),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("x-user-id" = String, Header, description = "Numeric ID of the user")
    )
)]
pub async fn command(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CommandPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user_id(&headers)?;
    let replies = state
        .engine
        .handle(user_id, Event::Command(payload.command.into()))
        .await?;
    Ok(render(replies))
}

/// Dispatch a text message.
#[utoipa::path(
    post,
    path = "/events/text",
    request_body = TextPayload,
    responses(
        (status = 200, description = "Replies to present to the user", body = [ReplyBody]),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("x-user-id" = String, Header, description = "Numeric ID of the user")
    )
)]
pub async fn text(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<TextPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user_id(&headers)?;
    let replies = state
        .engine
        .handle(
            user_id,
            Event::Text {
                message_id: payload.message_id,
                text: payload.text,
            },
        )
        .await?;
    Ok(render(replies))
}

/// Dispatch a voice message. Audio arrives base64-encoded.
#[utoipa::path(
    post,
    path = "/events/voice",
    request_body = VoicePayload,
    responses(
        (status = 200, description = "Replies to present to the user", body = [ReplyBody]),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("x-user-id" = String, Header, description = "Numeric ID of the user")
    )
)]
pub async fn voice(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<VoicePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user_id(&headers)?;
    let audio = BASE64
        .decode(&payload.audio)
        .map_err(|_| ApiError::BadRequest("audio must be valid base64".to_string()))?;
    let replies = state
        .engine
        .handle(
            user_id,
            Event::Voice {
                message_id: payload.message_id,
                audio,
            },
        )
        .await?;
    Ok(render(replies))
}

/// Dispatch an inline button press.
#[utoipa::path(
    post,
    path = "/events/button",
    request_body = ButtonPayload,
    responses(
        (status = 200, description = "Replies to present to the user", body = [ReplyBody]),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 422, description = "Unrecognized action payload", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("x-user-id" = String, Header, description = "Numeric ID of the user")
    )
)]
pub async fn button(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<ButtonPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user_id(&headers)?;
    let replies = state
        .engine
        .handle(
            user_id,
            Event::Button {
                payload: payload.payload,
            },
        )
        .await?;
    Ok(render(replies))
}
