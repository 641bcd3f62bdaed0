use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::StreamExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::BroadcastStream;

use super::AppState;
use super::error::ApiError;
use crate::memory::events::MemoryEvent;
use crate::memory::forgetting::ForgettingStats;
use crate::memory::types::MemoryEntry;
use crate::service::{ChatReply, MemoryService, QueryMatch, StoreStats, StoredMemory};

/// Body of the chat and store endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRequest {
    pub content: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// Store aggregates plus the forgetting process counters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub store: StoreStats,
    pub forgetting: ForgettingStats,
}

fn content_body(body: Result<Json<ContentRequest>, JsonRejection>) -> Result<String, ApiError> {
    match body {
        Ok(Json(request)) => Ok(request.content),
        Err(rejection) => Err(ApiError::bad_request("invalid_body", rejection.body_text())),
    }
}

pub async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ContentRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    let content = content_body(body)?;
    let reply = state.service.handle_text(&content).await?;
    Ok(Json(reply))
}

pub async fn store_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ContentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<StoredMemory>), ApiError> {
    let content = content_body(body)?;
    let stored = state.service.handle_store(&content).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

pub async fn memories_handler(
    State(state): State<Arc<AppState>>,
) -> Json<BTreeMap<String, MemoryEntry>> {
    Json(state.service.snapshot())
}

pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<QueryMatch>>, ApiError> {
    let text = query
        .q
        .ok_or_else(|| ApiError::bad_request("missing_parameter", "query parameter 'q' is required"))?;
    let matches = state.service.handle_query(&text).await?;
    Ok(Json(matches))
}

pub async fn memory_handler(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<StoredMemory>, ApiError> {
    match state.service.lookup(&key) {
        Some(entry) => Ok(Json(StoredMemory { key, entry })),
        None => Err(ApiError::NotFound(key)),
    }
}

pub async fn forget_handler(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<StatusCode, ApiError> {
    match state.service.evict(&key) {
        Some(_) => {
            tracing::info!("Evicted memory '{key}' on request");
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(ApiError::NotFound(key)),
    }
}

pub async fn stats_handler(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    Json(StatsResponse {
        store: state.service.stats(),
        forgetting: state.forgetter.stats(),
    })
}

/// SSE frames for one event: the event itself as a `data:` frame, then a
/// `notice` frame carrying the chat-facing system message, if it has one.
fn event_frames(event: &MemoryEvent) -> Vec<Result<Event, Infallible>> {
    let mut frames = Vec::with_capacity(2);
    if let Ok(json) = serde_json::to_string(event) {
        frames.push(Ok(Event::default().data(json)));
    }
    let notice = MemoryService::notice(event).and_then(|m| serde_json::to_string(&m).ok());
    if let Some(json) = notice {
        frames.push(Ok(Event::default().event("notice").data(json)));
    }
    frames
}

pub async fn events_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl futures::Stream<Item = Result<Event, Infallible>>> {
    let rx = state.service.subscribe();
    let stream = BroadcastStream::new(rx)
        .take_until(state.shutdown.clone().cancelled_owned())
        .filter_map(|result| async move { result.ok() })
        .flat_map(|event| futures::stream::iter(event_frames(&event)));

    Sse::new(stream).keep_alive(KeepAlive::default())
}
