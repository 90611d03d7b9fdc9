//! Route handlers for `/data` and `/instabook`.
//! `/` is served by `ServeFile` in `server.rs`.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::config::PollingConfig;
use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::provider::{BookingOutcome, RoomRecord};

/// Body of `GET /data`.
#[derive(Debug, Serialize)]
pub struct RoomSnapshot {
    /// Server local time, ISO-8601 without offset.
    pub now: String,
    pub polling: PollingConfig,
    pub instabook_times: Vec<u32>,
    pub rooms: Vec<RoomRecord>,
}

/// Body of `POST /instabook`.
#[derive(Debug, Deserialize)]
pub struct BookingRequest {
    pub room_id: String,
    pub length: u32,
}

pub async fn data(State(state): State<AppState>) -> Result<Json<RoomSnapshot>, ApiError> {
    let rooms = state.provider.get_room_data().await.inspect_err(|_| {
        metrics::record_provider_error("get_room_data");
    })?;

    Ok(Json(RoomSnapshot {
        now: Local::now()
            .naive_local()
            .format("%Y-%m-%dT%H:%M:%S%.6f")
            .to_string(),
        polling: state.config.polling.clone(),
        instabook_times: state.config.instabook.times.clone(),
        rooms,
    }))
}

pub async fn instabook(
    State(state): State<AppState>,
    payload: Result<Json<BookingRequest>, JsonRejection>,
) -> Result<Json<BookingOutcome>, ApiError> {
    let Json(request) = payload?;

    let offered = &state.config.instabook.times;
    if state.config.instabook.enforce_times && !offered.contains(&request.length) {
        return Err(ApiError::BadRequest(format!(
            "length must be one of {offered:?} minutes"
        )));
    }

    tracing::debug!(
        room_id = %request.room_id,
        length = request.length,
        provider = state.provider.name(),
        "InstaBook requested"
    );

    let outcome = state
        .provider
        .add_booking(&request.room_id, request.length)
        .await
        .inspect_err(|_| metrics::record_provider_error("add_booking"))?;

    Ok(Json(outcome))
}
