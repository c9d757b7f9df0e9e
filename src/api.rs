// src/api.rs
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::config::service::MAX_VIEW_LIMIT;
use crate::engine::{FeedHandle, FeedStats, SelectOutcome};
use crate::error::FeedError;
use crate::filter::{Choice, FilterSpec};
use crate::ingest::stream::parse_stream_payload;
use crate::ingest::types::SnapshotSource;
use crate::model::{Category, Impact, NewsEvent};
use crate::region::Region;
use crate::store::{BatchReport, IngestOutcome};

#[derive(Clone)]
pub struct AppState {
    pub feed: FeedHandle,
    pub snapshot: Arc<dyn SnapshotSource>,
    /// Cap applied when a request carries no `limit`.
    pub view_limit: usize,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/v1/news", get(news))
        .route("/api/v1/view", get(current_view))
        .route("/api/v1/filter", get(get_filter).put(put_filter))
        .route("/api/v1/select", post(select))
        .route("/api/v1/selection", get(selection))
        .route("/api/v1/events", post(push_event))
        .route("/api/v1/refresh", post(refresh))
        .route("/api/v1/stats", get(stats))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Error body: `{"error": "..."}` with a status derived from the failure kind.
pub struct ApiError(FeedError);

impl From<FeedError> for ApiError {
    fn from(e: FeedError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            FeedError::Transport(_) => StatusCode::BAD_GATEWAY,
            FeedError::MalformedEvent(_) => StatusCode::UNPROCESSABLE_ENTITY,
            FeedError::EngineClosed => StatusCode::SERVICE_UNAVAILABLE,
        };
        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// View row: the stored event plus its derived region.
#[derive(Debug, Serialize)]
pub struct ViewItem {
    #[serde(flatten)]
    pub event: NewsEvent,
    pub region: Region,
}

impl From<NewsEvent> for ViewItem {
    fn from(event: NewsEvent) -> Self {
        let region = event.region();
        Self { event, region }
    }
}

#[derive(Debug, Deserialize)]
struct NewsQuery {
    #[serde(default)]
    category: Choice<Category>,
    #[serde(default)]
    impact: Choice<Impact>,
    #[serde(default)]
    region: Choice<Region>,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct LimitQuery {
    #[serde(default)]
    limit: Option<usize>,
}

fn effective_limit(requested: Option<usize>, default: usize) -> usize {
    requested.unwrap_or(default).clamp(1, MAX_VIEW_LIMIT)
}

fn rows(events: Vec<NewsEvent>) -> Vec<ViewItem> {
    events.into_iter().map(ViewItem::from).collect()
}

/// Ad-hoc projection; dimensions left out of the query match everything.
async fn news(
    State(state): State<AppState>,
    Query(q): Query<NewsQuery>,
) -> ApiResult<Vec<ViewItem>> {
    let spec = FilterSpec {
        category: q.category,
        impact: q.impact,
        region: q.region,
    };
    let limit = effective_limit(q.limit, state.view_limit);
    let events = state.feed.view(spec, Some(limit)).await?;
    Ok(Json(rows(events)))
}

/// Projection under the active filter.
async fn current_view(
    State(state): State<AppState>,
    Query(q): Query<LimitQuery>,
) -> ApiResult<Vec<ViewItem>> {
    let limit = effective_limit(q.limit, state.view_limit);
    let events = state.feed.current_view(Some(limit)).await?;
    Ok(Json(rows(events)))
}

async fn get_filter(State(state): State<AppState>) -> ApiResult<FilterSpec> {
    Ok(Json(state.feed.filter().await?))
}

async fn put_filter(
    State(state): State<AppState>,
    Json(spec): Json<FilterSpec>,
) -> ApiResult<FilterSpec> {
    state.feed.set_filter(spec).await?;
    Ok(Json(spec))
}

#[derive(Debug, Deserialize)]
struct SelectReq {
    #[serde(deserialize_with = "crate::model::de_event_id")]
    id: String,
}

#[derive(Debug, Serialize)]
struct SelectResp {
    outcome: SelectOutcome,
}

async fn select(
    State(state): State<AppState>,
    Json(req): Json<SelectReq>,
) -> ApiResult<SelectResp> {
    let outcome = state.feed.select(req.id).await?;
    Ok(Json(SelectResp { outcome }))
}

#[derive(Debug, Serialize)]
struct SelectionResp {
    selected_id: Option<String>,
}

async fn selection(State(state): State<AppState>) -> ApiResult<SelectionResp> {
    let selected_id = state.feed.selection().await?;
    Ok(Json(SelectionResp { selected_id }))
}

#[derive(Debug, Serialize)]
struct PushResp {
    outcome: IngestOutcome,
}

/// Single push event. The raw body is parsed here so a bad payload maps to 422
/// the same way a bad stream frame is dropped.
async fn push_event(State(state): State<AppState>, body: String) -> ApiResult<PushResp> {
    let event = match parse_stream_payload(&body) {
        Ok(ev) => ev,
        Err(e) => {
            warn!(target: "api", error = %e, "rejecting malformed event");
            counter!("feed_stream_malformed_total").increment(1);
            return Err(e.into());
        }
    };
    let outcome = state.feed.ingest_stream(event).await?;
    Ok(Json(PushResp { outcome }))
}

async fn refresh(State(state): State<AppState>) -> ApiResult<BatchReport> {
    let report = crate::ingest::refresh_snapshot(state.snapshot.as_ref(), &state.feed).await?;
    Ok(Json(report))
}

async fn stats(State(state): State<AppState>) -> ApiResult<FeedStats> {
    Ok(Json(state.feed.stats().await?))
}
