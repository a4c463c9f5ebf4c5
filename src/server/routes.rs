use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::commands::CommandReply;
use crate::server::state::AppState;

/// Static liveness body for external uptime probes.
pub async fn alive() -> &'static str {
    "I'm alive!"
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

#[derive(Debug, Deserialize)]
pub struct AddAlertRequest {
    pub server_id: String,
    pub channel_id: String,
    pub youtube_channel_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RemoveAlertRequest {
    pub channel_id: String,
    pub youtube_channel_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ListAlertsQuery {
    pub channel_id: String,
}

#[derive(Debug, Serialize)]
pub struct AlertResponse {
    pub server_id: String,
    pub channel_id: String,
    pub youtube_channel_id: String,
}

pub async fn add_alert(
    State(state): State<AppState>,
    Json(request): Json<AddAlertRequest>,
) -> (StatusCode, Json<CommandReply>) {
    let reply = state.commands.add_alert(
        &request.server_id,
        &request.channel_id,
        &request.youtube_channel_id,
    );
    (reply_status(&reply), Json(reply))
}

pub async fn remove_alert(
    State(state): State<AppState>,
    Json(request): Json<RemoveAlertRequest>,
) -> (StatusCode, Json<CommandReply>) {
    let reply = state
        .commands
        .remove_alert(&request.channel_id, &request.youtube_channel_id);
    (reply_status(&reply), Json(reply))
}

pub async fn list_alerts(
    State(state): State<AppState>,
    Query(query): Query<ListAlertsQuery>,
) -> Result<Json<Vec<AlertResponse>>, StatusCode> {
    let subscriptions = state
        .subscriptions
        .list(&query.channel_id)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(
        subscriptions
            .into_iter()
            .map(|sub| AlertResponse {
                server_id: sub.server_id,
                channel_id: sub.channel_id,
                youtube_channel_id: sub.youtube_channel_id,
            })
            .collect(),
    ))
}

fn reply_status(reply: &CommandReply) -> StatusCode {
    if reply.ok {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    }
}
