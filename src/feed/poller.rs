use super::state::{self, FeedState};
use crate::error::FeedResult;
use crate::source::FeedSource;
use crate::stats::FeedStats;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub(in crate::feed) struct PollContext {
    pub(in crate::feed) source: Arc<dyn FeedSource>,
    pub(in crate::feed) state: Arc<Mutex<FeedState>>,
    pub(in crate::feed) stats: Arc<FeedStats>,
    pub(in crate::feed) interval: Duration,
    pub(in crate::feed) cancel: CancellationToken,
}

pub(in crate::feed) fn spawn(runtime: &Handle, ctx: PollContext) -> JoinHandle<()> {
    runtime.spawn(run(ctx))
}

async fn run(ctx: PollContext) {
    ctx.stats.record_request();
    let result = tokio::select! {
        _ = ctx.cancel.cancelled() => return,
        result = ctx.source.fetch_initial() => result,
    };
    let fetched = result.is_ok();
    let body = match result {
        Ok(body) => body,
        Err(err) => {
            tracing::warn!(error = %err, "initial fetch failed");
            ctx.stats.record_error(err.to_string());
            String::new()
        }
    };

    let loaded = {
        let mut state = state::lock(&ctx.state);
        if ctx.cancel.is_cancelled() {
            return;
        }
        if fetched {
            ctx.stats.clear_error();
        }
        state.append(&body, false, &ctx.stats);
        state.initial_pending = false;
        state.notify_initial();
        state.readings.len()
    };
    ctx.stats.mark_polled();
    tracing::info!(readings = loaded, "initial batch loaded");

    let mut ticker = tokio::time::interval_at(Instant::now() + ctx.interval, ctx.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = ctx.cancel.cancelled() => break,
            _ = ticker.tick() => spawn_tick(&ctx),
        }
    }
    tracing::debug!("poll loop exited");
}

/// Each tick owns its request; a slow response never holds up the next one.
fn spawn_tick(ctx: &PollContext) {
    let since = state::lock(&ctx.state).last_time;
    let ctx = ctx.clone();
    ctx.stats.record_request();

    tokio::spawn(async move {
        let result: FeedResult<String> = tokio::select! {
            _ = ctx.cancel.cancelled() => return,
            result = async {
                match since {
                    Some(since) => ctx.source.fetch_since(since).await,
                    None => ctx.source.fetch_initial().await,
                }
            } => result,
        };

        match result {
            Ok(body) => {
                let mut state = state::lock(&ctx.state);
                if ctx.cancel.is_cancelled() {
                    return;
                }
                ctx.stats.clear_error();
                let appended = state.append(&body, true, &ctx.stats);
                tracing::debug!(appended, ?since, "poll tick applied");
            }
            Err(err) => {
                tracing::warn!(error = %err, ?since, "poll request failed");
                ctx.stats.record_error(err.to_string());
            }
        }
        ctx.stats.mark_polled();
    });
}
