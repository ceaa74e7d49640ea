//! HTTP surface: JSON-in/JSON-out route handlers under `/api`.
//!
//! Expected/business failures come back as `{success: false, message}`
//! with a 4xx status; only the generic persistence message ever surfaces
//! for unexpected database errors. Mutating routes require the `x-api-key`
//! header when an admin key is configured.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::artworks;
use crate::db::Database;
use crate::display_order::{self, DisplayOrderUpdate};
use crate::entity::EntityKind;
use crate::error::{ActionError, ActionResult};
use crate::language::{self, LanguageInput};
use crate::orchestrator::handle_entity_translations;
use crate::security::constant_time_compare;
use crate::translations;
use crate::translator::Translator;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub translator: Arc<Translator>,
    pub admin_api_key: Option<String>,
}

fn error_status(err: &ActionError) -> StatusCode {
    match err {
        ActionError::Validation(_) | ActionError::UnsupportedEntity(_) => StatusCode::BAD_REQUEST,
        ActionError::NotFound(_) => StatusCode::NOT_FOUND,
        ActionError::ReferentialConflict { .. }
        | ActionError::InvariantViolation(_)
        | ActionError::UniquenessConflict { .. } => StatusCode::CONFLICT,
        ActionError::ExternalService(_) => StatusCode::BAD_GATEWAY,
        ActionError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Render an action result in the `{success, message?, data?}` shape.
fn respond<T: serde::Serialize>(result: ActionResult<T>) -> Response {
    match result {
        Ok(data) => (
            StatusCode::OK,
            Json(json!({ "success": true, "data": data })),
        )
            .into_response(),
        Err(e) => {
            if let ActionError::Persistence(inner) = &e {
                // Full detail stays server-side
                error!("Database error: {}", inner);
            }
            (
                error_status(&e),
                Json(json!({ "success": false, "message": e.to_string() })),
            )
                .into_response()
        }
    }
}

async fn require_api_key(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if let Some(expected) = &state.admin_api_key {
        if req.method() != axum::http::Method::GET {
            let provided = req
                .headers()
                .get("x-api-key")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("");
            if !constant_time_compare(provided, expected) {
                return (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "success": false, "message": "Invalid API key" })),
                )
                    .into_response();
            }
        }
    }
    next.run(req).await
}

// ==================== Handlers ====================

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn list_languages(State(state): State<AppState>) -> Response {
    respond(language::list_languages(&state.db))
}

async fn create_language(
    State(state): State<AppState>,
    Json(input): Json<LanguageInput>,
) -> Response {
    respond(language::create_language(&state.db, &input))
}

async fn get_language(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    respond(language::get_language(&state.db, id).and_then(|found| {
        found.ok_or_else(|| ActionError::NotFound(format!("Language {} not found", id)))
    }))
}

async fn update_language(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<LanguageInput>,
) -> Response {
    respond(language::update_language(&state.db, id, &input))
}

async fn delete_language(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    respond(language::delete_language(&state.db, id))
}

fn parse_kind(entity_type: &str) -> ActionResult<EntityKind> {
    entity_type.parse()
}

async fn get_entity_translations(
    State(state): State<AppState>,
    Path((entity_type, entity_id)): Path<(String, i64)>,
) -> Response {
    respond(parse_kind(&entity_type).and_then(|kind| {
        translations::get_translations_for_entity(&state.db, kind, entity_id)
    }))
}

#[derive(Debug, Deserialize)]
struct TranslatePayload {
    fields: BTreeMap<String, String>,
}

async fn translate_entity(
    State(state): State<AppState>,
    Path((entity_type, entity_id)): Path<(String, i64)>,
    Json(payload): Json<TranslatePayload>,
) -> Response {
    let kind = match parse_kind(&entity_type) {
        Ok(kind) => kind,
        Err(e) => return respond::<()>(Err(e)),
    };
    respond(
        handle_entity_translations(
            &state.db,
            &state.translator,
            kind,
            entity_id,
            &payload.fields,
        )
        .await,
    )
}

async fn delete_entity_translations(
    State(state): State<AppState>,
    Path((entity_type, entity_id)): Path<(String, i64)>,
) -> Response {
    respond(parse_kind(&entity_type).and_then(|kind| {
        let deleted = translations::delete_translations_for_entity(&state.db, kind, entity_id)?;
        Ok(json!({ "deleted": deleted }))
    }))
}

#[derive(Debug, Deserialize)]
struct PreviewPayload {
    q: String,
    source: String,
    target: String,
}

/// Translate one string without touching the store. Backs the admin UI's
/// translation preview; unlike the fan-out, an API failure surfaces here
/// as a 502.
async fn preview_translation(
    State(state): State<AppState>,
    Json(payload): Json<PreviewPayload>,
) -> Response {
    let result = state
        .translator
        .translate(&payload.q, &payload.source, &payload.target)
        .await
        .map(|translated| json!({ "translatedText": translated }))
        .map_err(|e| ActionError::ExternalService(e.to_string()));
    respond(result)
}

#[derive(Debug, Deserialize)]
struct ReorderPayload {
    entity_type: EntityKind,
    updates: Vec<DisplayOrderUpdate>,
}

async fn reorder(State(state): State<AppState>, Json(payload): Json<ReorderPayload>) -> Response {
    respond(display_order::update_display_order(
        &state.db,
        payload.entity_type,
        &payload.updates,
    ))
}

#[derive(Debug, Deserialize)]
struct CreateArtworkPayload {
    title: String,
}

async fn create_artwork(
    State(state): State<AppState>,
    Path(artist_id): Path<i64>,
    Json(payload): Json<CreateArtworkPayload>,
) -> Response {
    respond(artworks::create_presale_artwork(
        &state.db,
        artist_id,
        &payload.title,
    ))
}

async fn list_artworks(State(state): State<AppState>, Path(artist_id): Path<i64>) -> Response {
    respond(artworks::list_presale_artworks_by_artist(
        &state.db, artist_id,
    ))
}

async fn get_artwork(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    respond(artworks::get_presale_artwork(&state.db, id).and_then(|found| {
        found.ok_or_else(|| ActionError::NotFound(format!("Artwork {} not found", id)))
    }))
}

async fn delete_artwork(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    respond(artworks::delete_presale_artwork(&state.db, id))
}

async fn max_artist_order(State(state): State<AppState>, Path(artist_id): Path<i64>) -> Response {
    respond(
        display_order::get_max_display_order_by_artist(&state.db, artist_id)
            .map(|max| json!({ "max": max })),
    )
}

async fn reset_artist_order(State(state): State<AppState>, Path(artist_id): Path<i64>) -> Response {
    respond(
        display_order::reset_display_order_for_artist(&state.db, artist_id)
            .map(|count| json!({ "resequenced": count })),
    )
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/languages", get(list_languages).post(create_language))
        .route(
            "/api/languages/:id",
            get(get_language)
                .put(update_language)
                .delete(delete_language),
        )
        .route(
            "/api/translations/:entity_type/:entity_id",
            get(get_entity_translations)
                .post(translate_entity)
                .delete(delete_entity_translations),
        )
        .route("/api/translate/preview", post(preview_translation))
        .route("/api/display-order", post(reorder))
        .route(
            "/api/artists/:artist_id/artworks",
            get(list_artworks).post(create_artwork),
        )
        .route(
            "/api/artworks/:id",
            get(get_artwork).delete(delete_artwork),
        )
        .route(
            "/api/artists/:artist_id/display-order/max",
            get(max_artist_order),
        )
        .route(
            "/api/artists/:artist_id/display-order/reset",
            post(reset_artist_order),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until shutdown.
pub async fn serve(state: AppState, port: u16) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!("Listening on port {}", port);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
