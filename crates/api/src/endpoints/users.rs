//! Per-user push preference endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use campus_common::AppResult;
use campus_core::PushPreferenceResponse;
use serde::Deserialize;

use crate::{extractors::SessionUser, middleware::AppState};

/// Request to change the push preference.
#[derive(Debug, Deserialize)]
pub struct SetPreferenceRequest {
    pub enabled: bool,
}

async fn get_preference(
    session: SessionUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<PushPreferenceResponse>> {
    session.ensure(&id)?;
    Ok(Json(state.push_service.preference(&id).await?))
}

async fn set_preference(
    session: SessionUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SetPreferenceRequest>,
) -> AppResult<Json<PushPreferenceResponse>> {
    session.ensure(&id)?;
    let preference = state.push_service.set_preference(&id, req.enabled).await?;
    Ok(Json(preference))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/push", get(get_preference).put(set_preference))
}
