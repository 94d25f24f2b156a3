mod poller;
mod state;


use crate::error::{FeedError, FeedResult};
use crate::reading::Reading;
use crate::source::FeedSource;
use crate::stats::FeedStats;
use chrono::{DateTime, Utc};
use state::FeedState;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

pub type InitialHandler = Box<dyn Fn(&[Reading]) + Send + Sync>;
pub type UpdateHandler = Box<dyn Fn(&Reading) + Send + Sync>;

struct PollerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Accumulates readings from a [`FeedSource`] and notifies subscribers.
///
/// Handlers run with the feed's state locked, so they must not call back into
/// the same feed.
pub struct MeasurementFeed {
    source: Arc<dyn FeedSource>,
    state: Arc<Mutex<FeedState>>,
    stats: Arc<FeedStats>,
    poll_interval: Duration,
    poller: Option<PollerHandle>,
}

impl MeasurementFeed {
    pub fn new(source: Arc<dyn FeedSource>) -> Self {
        Self {
            source,
            state: Arc::new(Mutex::new(FeedState::new())),
            stats: Arc::new(FeedStats::new()),
            poll_interval: DEFAULT_POLL_INTERVAL,
            poller: None,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_millis(1));
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn stats(&self) -> Arc<FeedStats> {
        self.stats.clone()
    }

    /// Parses a response body and appends its readings, returning how many
    /// lines were accepted. An empty body is a no-op.
    pub fn append(&self, body: &str, emit_updates: bool) -> usize {
        state::lock(&self.state).append(body, emit_updates, &self.stats)
    }

    /// Subscribes to the initial batch.
    ///
    /// When the feed already holds readings and no initial fetch is in flight,
    /// `handler` is called right away with them. It stays registered either
    /// way and fires again each time `start` delivers an initial batch, so a
    /// handler registered on a non-empty feed before `start` is called twice:
    /// once now and once with the first batch.
    pub fn on_initial<F>(&self, handler: F)
    where
        F: Fn(&[Reading]) + Send + Sync + 'static,
    {
        let mut state = state::lock(&self.state);
        if !state.readings.is_empty() && !state.initial_pending {
            handler(state.readings.as_slice());
        }
        state.initial_handlers.push(Box::new(handler));
    }

    pub fn on_update<F>(&self, handler: F)
    where
        F: Fn(&Reading) + Send + Sync + 'static,
    {
        state::lock(&self.state).update_handlers.push(Box::new(handler));
    }

    /// Fetches the initial batch, then polls for newer readings every
    /// `poll_interval`. Must be called from within a tokio runtime.
    pub fn start(&mut self) -> FeedResult<()> {
        if self.is_running() {
            return Err(FeedError::AlreadyRunning);
        }
        let runtime = Handle::try_current().map_err(|_| FeedError::NoRuntime)?;

        let cancel = CancellationToken::new();
        state::lock(&self.state).initial_pending = true;
        let task = poller::spawn(
            &runtime,
            poller::PollContext {
                source: self.source.clone(),
                state: self.state.clone(),
                stats: self.stats.clone(),
                interval: self.poll_interval,
                cancel: cancel.clone(),
            },
        );
        tracing::info!(
            interval_ms = self.poll_interval.as_millis() as u64,
            "measurement feed started"
        );
        self.poller = Some(PollerHandle { cancel, task });
        Ok(())
    }

    /// Halts polling. Responses still in flight are discarded. No-op when the
    /// feed is not running.
    pub fn stop(&mut self) {
        let Some(poller) = self.poller.take() else {
            return;
        };
        poller.cancel.cancel();
        poller.task.abort();
        state::lock(&self.state).initial_pending = false;
        tracing::info!("measurement feed stopped");
    }

    pub fn is_running(&self) -> bool {
        self.poller.is_some()
    }

    /// Drops every reading and forgets the last timestamp. Handlers stay
    /// registered.
    pub fn clear(&self) {
        state::lock(&self.state).clear();
    }

    pub fn len(&self) -> usize {
        state::lock(&self.state).readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn last_time(&self) -> Option<DateTime<Utc>> {
        state::lock(&self.state).last_time
    }

    pub fn readings(&self) -> Vec<Reading> {
        state::lock(&self.state).readings.clone()
    }

    /// Borrows the current readings without copying them.
    pub fn with_readings<R>(&self, f: impl FnOnce(&[Reading]) -> R) -> R {
        f(state::lock(&self.state).readings.as_slice())
    }
}

impl Drop for MeasurementFeed {
    fn drop(&mut self) {
        self.stop();
    }
}
