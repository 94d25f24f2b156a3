use super::{InitialHandler, UpdateHandler};
use crate::reading::{parse_body, Reading};
use crate::stats::FeedStats;
use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard, PoisonError};

pub(in crate::feed) struct FeedState {
    pub(in crate::feed) readings: Vec<Reading>,
    pub(in crate::feed) last_time: Option<DateTime<Utc>>,
    /// Set while a started feed has not yet delivered its initial batch.
    pub(in crate::feed) initial_pending: bool,
    pub(in crate::feed) initial_handlers: Vec<InitialHandler>,
    pub(in crate::feed) update_handlers: Vec<UpdateHandler>,
}

impl FeedState {
    pub(in crate::feed) fn new() -> Self {
        Self {
            readings: Vec::new(),
            last_time: None,
            initial_pending: false,
            initial_handlers: Vec::new(),
            update_handlers: Vec::new(),
        }
    }

    /// Parses `body` and appends every valid line in order. Update handlers
    /// run right after their line is appended when `emit_updates` is set.
    pub(in crate::feed) fn append(
        &mut self,
        body: &str,
        emit_updates: bool,
        stats: &FeedStats,
    ) -> usize {
        if body.is_empty() {
            return 0;
        }

        let mut appended = 0;
        for (line, parsed) in parse_body(body) {
            match parsed {
                Ok(reading) => {
                    self.readings.push(reading);
                    self.last_time = Some(reading.timestamp);
                    appended += 1;
                    if emit_updates {
                        for handler in &self.update_handlers {
                            handler(&reading);
                        }
                    }
                }
                Err(err) => {
                    stats.record_skipped();
                    tracing::warn!(line, error = %err, "skipping malformed reading");
                }
            }
        }

        stats.record_appended(appended);
        appended
    }

    pub(in crate::feed) fn notify_initial(&self) {
        for handler in &self.initial_handlers {
            handler(self.readings.as_slice());
        }
    }

    pub(in crate::feed) fn clear(&mut self) {
        self.readings.clear();
        self.last_time = None;
    }
}

pub(in crate::feed) fn lock(state: &Mutex<FeedState>) -> MutexGuard<'_, FeedState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
