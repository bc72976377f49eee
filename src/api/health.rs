//! Shared health state for the /health endpoint.
//! Updated by the Poller, read by the API.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::poller::CycleReport;

#[derive(Default)]
pub struct HealthState {
    /// True while a poll cycle is iterating the roster.
    running: AtomicBool,
    cycles_completed: AtomicU64,
    /// Millisecond timestamps (0 = never).
    last_cycle_started_ms: AtomicI64,
    last_cycle_finished_ms: AtomicI64,
    last_report: Mutex<Option<CycleReport>>,
}

#[derive(Debug, Serialize)]
pub struct HealthSnapshot {
    pub state: &'static str,
    pub cycles_completed: u64,
    pub last_cycle_started_at: Option<DateTime<Utc>>,
    pub last_cycle_finished_at: Option<DateTime<Utc>>,
    pub last_report: Option<CycleReport>,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    /// IDLE → RUNNING. False if a cycle is already running.
    pub fn try_start_cycle(&self, at: DateTime<Utc>) -> bool {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        self.last_cycle_started_ms.store(at.timestamp_millis(), Ordering::Relaxed);
        true
    }

    /// RUNNING → IDLE.
    pub fn finish_cycle(&self, at: DateTime<Utc>, report: Option<CycleReport>) {
        self.last_cycle_finished_ms.store(at.timestamp_millis(), Ordering::Relaxed);
        if let Some(report) = report {
            self.cycles_completed.fetch_add(1, Ordering::Relaxed);
            if let Ok(mut last) = self.last_report.lock() {
                *last = Some(report);
            }
        }
        self.running.store(false, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        HealthSnapshot {
            state: if self.is_running() { "running" } else { "idle" },
            cycles_completed: self.cycles_completed(),
            last_cycle_started_at: millis_to_time(self.last_cycle_started_ms.load(Ordering::Relaxed)),
            last_cycle_finished_at: millis_to_time(self.last_cycle_finished_ms.load(Ordering::Relaxed)),
            last_report: self.last_report.lock().ok().and_then(|r| r.clone()),
        }
    }
}

fn millis_to_time(ms: i64) -> Option<DateTime<Utc>> {
    if ms == 0 {
        return None;
    }
    DateTime::from_timestamp_millis(ms)
}
