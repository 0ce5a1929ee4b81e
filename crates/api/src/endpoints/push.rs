//! Push subscription endpoints.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, header::USER_AGENT},
    routing::{delete, get, post},
};
use campus_common::AppResult;
use campus_core::{PushSubscriptionResponse, SubscribeInput};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{extractors::SessionUser, middleware::AppState};

/// VAPID public key response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyResponse {
    pub public_key: String,
}

/// Request to remove a device subscription.
#[derive(Debug, Deserialize)]
pub struct UnsubscribeRequest {
    pub endpoint: String,
}

/// Get the application server key.
async fn public_key(State(state): State<AppState>) -> AppResult<Json<PublicKeyResponse>> {
    let public_key = state.push_service.public_key()?.to_string();
    Ok(Json(PublicKeyResponse { public_key }))
}

/// Store this device's subscription for the session user.
async fn subscribe(
    SessionUser(user_id): SessionUser,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<SubscribeInput>,
) -> AppResult<Json<PushSubscriptionResponse>> {
    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let subscription = state
        .push_service
        .register(&user_id, input, user_agent)
        .await?;

    Ok(Json(subscription))
}

/// Remove a device subscription by endpoint.
async fn unsubscribe(
    SessionUser(user_id): SessionUser,
    State(state): State<AppState>,
    Json(req): Json<UnsubscribeRequest>,
) -> AppResult<Json<Value>> {
    state
        .push_service
        .unregister_by_endpoint(&user_id, &req.endpoint)
        .await?;

    Ok(Json(json!({})))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/public-key", get(public_key))
        .route("/subscribe", post(subscribe))
        .route("/unsubscribe", delete(unsubscribe))
}
