//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the bot front end,
//! including the event endpoints and OpenAPI documentation.

use crate::{
    handlers,
    models::{
        ActionBody, ButtonPayload, CommandKind, CommandPayload, ErrorResponse, ReplyBody,
        TextPayload, VoicePayload,
    },
    state::AppState,
};

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::healthz,
        handlers::command,
        handlers::text,
        handlers::voice,
        handlers::button,
    ),
    components(
        schemas(CommandPayload, TextPayload, VoicePayload, ButtonPayload, ReplyBody, ActionBody, ErrorResponse, CommandKind)
    ),
    tags(
        (name = "Parley Bot", description = "Event dispatch for the Parley conversation engine")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    // Group all routes that require AppState into their own router.
    let api_router = Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/events/command", post(handlers::command))
        .route("/events/text", post(handlers::text))
        .route("/events/voice", post(handlers::voice))
        .route("/events/button", post(handlers::button))
        .with_state(app_state);

    // Merge the stateful routes with the stateless Swagger UI routes.
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
}
