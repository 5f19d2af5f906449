// 🌐 HTTP API - Routes requests to the registry
//
// Thin layer: parse the request, call the registry, wrap the result.
// Every RegistryError becomes a structured ResponseError body.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::card::{Card, CardCreate, CountryList};
use crate::error::{RegistryError, ResponseError};
use crate::registry::Registry;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
}

/// API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn failure(error: ResponseError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

impl IntoResponse for RegistryError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            warn!(error = %self, "request failed");
        }
        (status, Json(ApiResponse::failure(self.to_response()))).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, RegistryError>;

fn malformed(rejection: JsonRejection) -> RegistryError {
    RegistryError::MalformedRequest(rejection.body_text())
}

#[derive(Serialize)]
pub struct BannedResponse {
    pub banned: Vec<String>,
}

#[derive(Serialize)]
pub struct UnbannedResponse {
    pub unbanned: Vec<String>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// POST /api/v1/cards - Register a card if it passes validation
async fn create_card(
    State(state): State<AppState>,
    body: Result<Json<CardCreate>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Card>>), RegistryError> {
    let Json(candidate) = body.map_err(malformed)?;
    let card = state.registry.create_card(candidate).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(card))))
}

/// GET /api/v1/cards - All cards, ordered by id
async fn list_cards(State(state): State<AppState>) -> ApiResult<Vec<Card>> {
    Ok(Json(ApiResponse::ok(state.registry.list_cards()?)))
}

/// GET /api/v1/cards/:id - A single card
async fn get_card(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Card> {
    let id = Uuid::parse_str(&id)
        .map_err(|e| RegistryError::MalformedRequest(format!("invalid card id {:?}: {}", id, e)))?;
    Ok(Json(ApiResponse::ok(state.registry.get_card(id)?)))
}

/// GET /api/v1/countries/ban - Current ban list
async fn list_banned(State(state): State<AppState>) -> ApiResult<BannedResponse> {
    let banned = state.registry.banned_countries()?;
    Ok(Json(ApiResponse::ok(BannedResponse { banned })))
}

/// POST /api/v1/countries/ban - Ban countries, answers with the newly banned ones
async fn ban_countries(
    State(state): State<AppState>,
    body: Result<Json<CountryList>, JsonRejection>,
) -> ApiResult<BannedResponse> {
    let Json(list) = body.map_err(malformed)?;
    let banned = state.registry.ban_countries(&list.countries)?;
    Ok(Json(ApiResponse::ok(BannedResponse { banned })))
}

/// POST /api/v1/countries/unban - Unban countries, answers with the removed ones
async fn unban_countries(
    State(state): State<AppState>,
    body: Result<Json<CountryList>, JsonRejection>,
) -> ApiResult<UnbannedResponse> {
    let Json(list) = body.map_err(malformed)?;
    let unbanned = state.registry.unban_countries(&list.countries)?;
    Ok(Json(ApiResponse::ok(UnbannedResponse { unbanned })))
}

// ============================================================================
// Router
// ============================================================================

pub fn router(registry: Arc<Registry>) -> Router {
    let state = AppState { registry };

    let v1 = Router::new()
        .route("/cards", post(create_card).get(list_cards))
        .route("/cards/:id", get(get_card))
        .route("/countries/ban", post(ban_countries).get(list_banned))
        .route("/countries/unban", post(unban_countries));

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .nest("/v1", v1);

    Router::new().nest("/api", api_routes).with_state(state)
}
