use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::api::HealthState;
use crate::db::DrawStore;
use crate::error::AppError;
use crate::fetcher::DrawSource;
use crate::normalize::{normalize_item, unwrap_items};
use crate::types::{TickOutcome, TickStage, TickSummary};

/// Fetch-normalize-upsert pipeline. One instance lives for the whole process;
/// the guard keeps at most one tick running whether it came from the
/// scheduler or from a manual trigger.
pub struct Collector<S: DrawSource> {
    source: S,
    store: DrawStore,
    health: Arc<HealthState>,
    tick_lock: Mutex<()>,
}

struct TickFailure {
    stage: TickStage,
    error: AppError,
    /// Rows already committed when the tick aborted.
    saved: usize,
}

impl TickFailure {
    fn at(stage: TickStage) -> impl FnOnce(AppError) -> TickFailure {
        move |error| TickFailure { stage, error, saved: 0 }
    }
}

impl<S: DrawSource> Collector<S> {
    pub fn new(source: S, store: DrawStore, health: Arc<HealthState>) -> Self {
        Self {
            source,
            store,
            health,
            tick_lock: Mutex::new(()),
        }
    }

    /// Scheduler loop. Each tick runs in its own task so a panic inside one
    /// tick is logged and the loop carries on. Aborting the loop aborts the
    /// tick in flight as well.
    pub async fn run(self: Arc<Self>, every: Duration) {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!("Collector started, ticking every {every:?}");

        loop {
            ticker.tick().await;
            let collector = Arc::clone(&self);
            let mut tick = AbortOnDrop(tokio::spawn(async move { collector.tick().await }));
            if let Err(e) = (&mut tick.0).await {
                error!("Tick task aborted: {e}");
            }
        }
    }

    /// Scheduled tick. Skipped when another tick still holds the guard.
    pub async fn tick(&self) -> TickOutcome {
        let Ok(_guard) = self.tick_lock.try_lock() else {
            debug!("Previous tick still running, skipping");
            let outcome = TickOutcome::Busy;
            self.health.record_outcome(&outcome);
            return outcome;
        };
        self.run_tick().await
    }

    /// Manual tick. Waits for any running tick, then runs.
    pub async fn tick_now(&self) -> TickOutcome {
        let _guard = self.tick_lock.lock().await;
        self.run_tick().await
    }

    async fn run_tick(&self) -> TickOutcome {
        let _running = self.health.begin_tick();
        debug!("Tick started");

        let outcome = match self.collect().await {
            Ok(summary) => {
                info!(
                    items = summary.items,
                    saved = summary.saved,
                    duplicates = summary.duplicates,
                    rejected = summary.rejected,
                    "Tick complete: saved {} new draws",
                    summary.saved,
                );
                TickOutcome::Completed(summary)
            }
            Err(failure) => {
                log_failure(&failure);
                TickOutcome::Failed {
                    stage: failure.stage,
                    error: failure.error.to_string(),
                }
            }
        };

        self.health.record_outcome(&outcome);
        outcome
    }

    async fn collect(&self) -> Result<TickSummary, TickFailure> {
        let response = self
            .source
            .fetch()
            .await
            .map_err(TickFailure::at(TickStage::Fetching))?;
        let body = response
            .into_body()
            .map_err(TickFailure::at(TickStage::Fetching))?;

        let parsed: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| TickFailure::at(TickStage::Parsing)(AppError::from(e)))?;
        let items = unwrap_items(parsed);

        let mut summary = TickSummary {
            items: items.len(),
            ..TickSummary::default()
        };

        let mut session = self
            .store
            .session()
            .await
            .map_err(TickFailure::at(TickStage::Persisting))?;
        session
            .ensure_schema()
            .await
            .map_err(TickFailure::at(TickStage::Persisting))?;

        for item in items {
            let draw = match normalize_item(item, Utc::now()) {
                Ok(draw) => draw,
                Err(reason) => {
                    summary.rejected += 1;
                    debug!(%reason, "Skipping draw item");
                    continue;
                }
            };

            match session.insert_draw(&draw).await {
                Ok(true) => {
                    summary.saved += 1;
                    debug!(
                        period = draw.period,
                        number = draw.winning_number,
                        color = %draw.result_color,
                        size = %draw.result_size,
                        "Saved draw"
                    );
                }
                Ok(false) => summary.duplicates += 1,
                Err(error) => {
                    return Err(TickFailure {
                        stage: TickStage::Persisting,
                        error,
                        saved: summary.saved,
                    })
                }
            }
        }

        Ok(summary)
    }
}

struct AbortOnDrop(JoinHandle<TickOutcome>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn log_failure(failure: &TickFailure) {
    let stage = failure.stage;
    match &failure.error {
        AppError::Blocked => warn!(%stage, "Upstream is blocking us (403), skipping tick"),
        AppError::UpstreamStatus(status) => {
            warn!(%stage, status, "Upstream returned HTTP {status}, skipping tick")
        }
        AppError::Database(e) => error!(
            %stage,
            saved_before_failure = failure.saved,
            "Store failure, tick aborted: {e}"
        ),
        e => warn!(%stage, "Tick failed: {e}"),
    }
}
