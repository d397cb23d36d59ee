use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tracing::info;

use crate::api::health::{HealthSnapshot, HealthState};
use crate::collector::Collector;
use crate::config::HISTORY_LIMIT;
use crate::db::models::DrawRow;
use crate::db::DrawStore;
use crate::error::AppError;
use crate::fetcher::DrawSource;
use crate::types::TickOutcome;

pub struct ApiState<S: DrawSource> {
    pub store: DrawStore,
    pub collector: Arc<Collector<S>>,
    pub health: Arc<HealthState>,
}

// Manual impl: derive would require `S: Clone`.
impl<S: DrawSource> Clone for ApiState<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            collector: Arc::clone(&self.collector),
            health: Arc::clone(&self.health),
        }
    }
}

pub fn router<S: DrawSource>(state: ApiState<S>) -> Router {
    Router::new()
        .route("/", get(get_status::<S>))
        .route("/history", get(get_history::<S>))
        .route("/update", get(trigger_update::<S>))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub message: &'static str,
    pub health: HealthSnapshot,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub period: i64,
    pub number: i64,
    pub size: String,
    pub color: String,
}

impl From<DrawRow> for HistoryEntry {
    fn from(r: DrawRow) -> Self {
        Self {
            period: r.period,
            number: r.winning_number,
            size: r.result_size,
            color: r.result_color,
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_status<S: DrawSource>(State(state): State<ApiState<S>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        message: "Draw collector running",
        health: state.health.snapshot(),
    })
}

async fn get_history<S: DrawSource>(
    State(state): State<ApiState<S>>,
) -> Result<Json<Vec<HistoryEntry>>, AppError> {
    let rows = state.store.recent_draws(HISTORY_LIMIT).await?;
    Ok(Json(rows.into_iter().map(HistoryEntry::from).collect()))
}

/// Runs one tick now, waiting behind a scheduled tick if one is in flight.
async fn trigger_update<S: DrawSource>(State(state): State<ApiState<S>>) -> Json<TickOutcome> {
    let outcome = state.collector.tick_now().await;
    info!(saved = outcome.saved(), "Manual update finished");
    Json(outcome)
}
