//! Shared health state for the status endpoint.
//! Updated by the Collector after every tick, read by the API.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::types::TickOutcome;

#[derive(Default)]
pub struct HealthState {
    /// True while a tick holds the collector guard.
    pub tick_running: AtomicBool,
    /// Nanosecond timestamp of the last finished tick (0 = none).
    pub last_tick_at_ns: AtomicU64,
    /// Nanosecond timestamp of the last completed tick (0 = none).
    pub last_success_at_ns: AtomicU64,
    pub ticks_completed: AtomicU64,
    pub ticks_failed: AtomicU64,
    /// Scheduled ticks dropped because another tick was running.
    pub ticks_skipped: AtomicU64,
    pub consecutive_failures: AtomicU64,
    /// Draws newly saved since startup.
    pub total_saved: AtomicU64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthSnapshot {
    pub tick_running: bool,
    pub last_tick_at_ns: Option<u64>,
    pub last_success_at_ns: Option<u64>,
    pub ticks_completed: u64,
    pub ticks_failed: u64,
    pub ticks_skipped: u64,
    pub consecutive_failures: u64,
    pub total_saved: u64,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a tick as running until the returned guard is dropped, which also
    /// covers a tick whose future is cancelled or unwinds.
    pub fn begin_tick(&self) -> TickRunning<'_> {
        self.tick_running.store(true, Ordering::Relaxed);
        TickRunning { health: self }
    }

    pub fn record_outcome(&self, outcome: &TickOutcome) {
        let now = now_ns();
        match outcome {
            TickOutcome::Completed(summary) => {
                self.last_tick_at_ns.store(now, Ordering::Relaxed);
                self.last_success_at_ns.store(now, Ordering::Relaxed);
                self.ticks_completed.fetch_add(1, Ordering::Relaxed);
                self.consecutive_failures.store(0, Ordering::Relaxed);
                self.total_saved.fetch_add(summary.saved as u64, Ordering::Relaxed);
            }
            TickOutcome::Failed { .. } => {
                self.last_tick_at_ns.store(now, Ordering::Relaxed);
                self.ticks_failed.fetch_add(1, Ordering::Relaxed);
                self.consecutive_failures.fetch_add(1, Ordering::Relaxed);
            }
            TickOutcome::Busy => {
                self.ticks_skipped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn consecutive_failures(&self) -> u64 {
        self.consecutive_failures.load(Ordering::Relaxed)
    }

    pub fn total_saved(&self) -> u64 {
        self.total_saved.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        let nonzero = |v: u64| (v != 0).then_some(v);
        HealthSnapshot {
            tick_running: self.tick_running.load(Ordering::Relaxed),
            last_tick_at_ns: nonzero(self.last_tick_at_ns.load(Ordering::Relaxed)),
            last_success_at_ns: nonzero(self.last_success_at_ns.load(Ordering::Relaxed)),
            ticks_completed: self.ticks_completed.load(Ordering::Relaxed),
            ticks_failed: self.ticks_failed.load(Ordering::Relaxed),
            ticks_skipped: self.ticks_skipped.load(Ordering::Relaxed),
            consecutive_failures: self.consecutive_failures(),
            total_saved: self.total_saved(),
        }
    }
}

pub struct TickRunning<'a> {
    health: &'a HealthState,
}

impl Drop for TickRunning<'_> {
    fn drop(&mut self) {
        self.health.tick_running.store(false, Ordering::Relaxed);
    }
}

fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TickStage, TickSummary};

    fn failed() -> TickOutcome {
        TickOutcome::Failed {
            stage: TickStage::Fetching,
            error: "Upstream blocked the request (HTTP 403)".to_string(),
        }
    }

    #[test]
    fn fresh_state_has_no_ticks() {
        let snap = HealthState::new().snapshot();
        assert!(!snap.tick_running);
        assert_eq!(snap.last_tick_at_ns, None);
        assert_eq!(snap.last_success_at_ns, None);
        assert_eq!(snap.total_saved, 0);
    }

    #[test]
    fn failures_accumulate_until_a_success() {
        let health = HealthState::new();
        health.record_outcome(&failed());
        health.record_outcome(&failed());
        assert_eq!(health.consecutive_failures(), 2);
        assert!(health.snapshot().last_success_at_ns.is_none());

        health.record_outcome(&TickOutcome::Completed(TickSummary {
            items: 10,
            saved: 4,
            duplicates: 6,
            rejected: 0,
        }));
        let snap = health.snapshot();
        assert_eq!(snap.consecutive_failures, 0);
        assert_eq!(snap.ticks_failed, 2);
        assert_eq!(snap.ticks_completed, 1);
        assert_eq!(snap.total_saved, 4);
        assert!(snap.last_success_at_ns.is_some());
    }

    #[test]
    fn running_flag_clears_when_guard_drops() {
        let health = HealthState::new();
        let guard = health.begin_tick();
        assert!(health.snapshot().tick_running);
        drop(guard);
        assert!(!health.snapshot().tick_running);
    }

    #[test]
    fn busy_counts_as_skipped() {
        let health = HealthState::new();
        health.record_outcome(&TickOutcome::Busy);
        let snap = health.snapshot();
        assert_eq!(snap.ticks_skipped, 1);
        assert_eq!(snap.last_tick_at_ns, None);
    }
}
