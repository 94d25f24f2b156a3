use chrono::Utc;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Counters shared between a running feed and whoever holds it.
#[derive(Debug, Default)]
pub struct FeedStats {
    pub requests_issued: AtomicU64,
    pub failed_requests: AtomicU64,
    pub readings_appended: AtomicU64,
    pub lines_skipped: AtomicU64,
    pub last_poll_unix_ms: AtomicU64,
    pub last_error: Mutex<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub requests_issued: u64,
    pub failed_requests: u64,
    pub readings_appended: u64,
    pub lines_skipped: u64,
    pub last_poll_unix_ms: u64,
    pub last_error: Option<String>,
}

impl FeedStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self) {
        self.requests_issued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_appended(&self, count: usize) {
        self.readings_appended
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.lines_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn mark_polled(&self) {
        let now = Utc::now().timestamp_millis().max(0) as u64;
        self.last_poll_unix_ms.store(now, Ordering::Relaxed);
    }

    pub fn record_error(&self, err: impl Into<String>) {
        self.failed_requests.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut guard) = self.last_error.lock() {
            *guard = Some(err.into());
        }
    }

    pub fn clear_error(&self) {
        if let Ok(mut guard) = self.last_error.lock() {
            *guard = None;
        }
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().ok().and_then(|guard| guard.clone())
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            requests_issued: self.requests_issued.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            readings_appended: self.readings_appended.load(Ordering::Relaxed),
            lines_skipped: self.lines_skipped.load(Ordering::Relaxed),
            last_poll_unix_ms: self.last_poll_unix_ms.load(Ordering::Relaxed),
            last_error: self.last_error(),
        }
    }
}
