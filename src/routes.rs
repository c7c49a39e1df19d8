use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use log::{debug, info};
use serde::Deserialize;
use serde_json::json;

use crate::{
    error::AppError,
    record::{Bird, BirdWithSeenStatus, RemovalResponse, Sighting, SightingRequest},
    state::AppState,
};

#[derive(Deserialize)]
pub struct BirdsQuery {
    #[serde(rename = "userId")]
    user_id: Option<String>,
}

fn parse_id(raw: &str, what: &'static str) -> Result<u64, AppError> {
    raw.trim().parse().map_err(|_| AppError::InvalidId(what))
}

pub async fn birds_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BirdsQuery>,
) -> Result<Json<Vec<BirdWithSeenStatus>>, AppError> {
    let user_id = query
        .user_id
        .as_deref()
        .map(|raw| parse_id(raw, "user"))
        .transpose()?;

    let birds = state.service().birds_with_seen_status(user_id);
    debug!("Listing {} birds for user {:?}", birds.len(), user_id);

    Ok(Json(birds))
}

pub async fn bird_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Bird>, AppError> {
    let id = parse_id(&id, "bird")?;

    state
        .service()
        .bird(id)
        .map(Json)
        .ok_or(AppError::NotFound("Bird"))
}

pub async fn add_sighting_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SightingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Sighting>), AppError> {
    let Json(request) = payload.map_err(|e| AppError::MalformedPayload(e.body_text()))?;

    let sighting = state
        .service()
        .mark_seen(request.user_id, request.bird_id);
    info!(
        "User {} marked bird {} as seen",
        request.user_id, request.bird_id
    );

    Ok((StatusCode::CREATED, Json(sighting)))
}

pub async fn remove_sighting_handler(
    State(state): State<Arc<AppState>>,
    Path((user_id, bird_id)): Path<(String, String)>,
) -> Result<Json<RemovalResponse>, AppError> {
    let user_id = parse_id(&user_id, "user")?;
    let bird_id = parse_id(&bird_id, "bird")?;

    let success = state.service().mark_unseen(user_id, bird_id);
    info!("User {} marked bird {} as unseen", user_id, bird_id);

    Ok(Json(RemovalResponse { success }))
}

pub async fn sightings_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Sighting>>, AppError> {
    let user_id = parse_id(&user_id, "user")?;

    Ok(Json(state.service().sightings_for(user_id)))
}

pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let birds = state.service().bird_count();
    Json(json!({ "status": "ok", "birds": birds }))
}
