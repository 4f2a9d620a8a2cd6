//! Concurrent purchase waves against one voucher.
//!
//! Every credential gets its own task. In fire-once mode the task issues a
//! single request; in sustained mode it loops until the shared shutdown
//! channel fires, polling it without blocking between requests. The loop has
//! no backoff, so CPU use grows with the number of credentials.
mod classify;

#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until, timeout_at};
use tracing::{info, warn};

use crate::api::PurchaseApi;
use crate::domain::{
    Credential, RunMode, Token, VoucherId, ensure_distinct_tokens, ensure_unique,
};
use crate::error::ValidationError;
use crate::metrics::{Outcome, StatsAggregator};
use crate::shutdown::{ShutdownReceiver, ShutdownSender, is_fired};

pub use classify::classify;

/// Default time allowed after the deadline for loops to notice it.
pub const DEFAULT_GRACE: Duration = Duration::from_secs(1);

/// What a finished run looked like from the driver's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadRunSummary {
    pub mode: RunMode,
    /// Run start until the last task exited.
    pub elapsed: Duration,
    pub tasks: usize,
    /// Loops still running when the grace period ran out.
    pub stragglers: usize,
}

/// Drives purchase attempts for a set of credentials.
pub struct LoadDriver<P: ?Sized> {
    api: Arc<P>,
    grace: Duration,
}

impl<P> LoadDriver<P>
where
    P: PurchaseApi + ?Sized + 'static,
{
    #[must_use]
    pub const fn new(api: Arc<P>, grace: Duration) -> Self {
        Self { api, grace }
    }

    /// Runs one wave and records every attempt into `stats`.
    ///
    /// `shutdown_rx` must be subscribed before the caller's own work began, so
    /// a shutdown that fired earlier stops the run before any request goes
    /// out. In sustained mode the shutdown channel fires at the deadline;
    /// firing it earlier (Ctrl+C) ends the loops early and the run still
    /// reports. A fire-once wave is abandoned on shutdown. Each dispatched
    /// request is always recorded, even when it completes after the grace
    /// period.
    ///
    /// # Errors
    ///
    /// Returns `NoCredentials` for an empty set, `DuplicateIdentity` or
    /// `SharedToken` when credentials overlap, and `Interrupted` when
    /// shutdown fired before or during a fire-once wave.
    pub async fn run(
        &self,
        credentials: &[Credential],
        voucher: &VoucherId,
        mode: RunMode,
        stats: &Arc<StatsAggregator>,
        shutdown_tx: &ShutdownSender,
        shutdown_rx: &mut ShutdownReceiver,
    ) -> Result<LoadRunSummary, ValidationError> {
        if credentials.is_empty() {
            return Err(ValidationError::NoCredentials);
        }
        ensure_unique(credentials.iter().map(|credential| credential.identity()))?;
        ensure_distinct_tokens(credentials)?;
        if is_fired(shutdown_rx) {
            warn!("Shutdown requested before the purchase run started");
            return Err(interrupted());
        }

        info!(
            "Starting {} purchase run: {} credentials against voucher {}",
            mode.as_str(),
            credentials.len(),
            voucher
        );
        let start = Instant::now();
        let voucher = Arc::new(voucher.clone());

        let mut handles: Vec<JoinHandle<Instant>> = Vec::with_capacity(credentials.len());
        match mode {
            RunMode::FireOnce => {
                for credential in credentials {
                    let api = Arc::clone(&self.api);
                    let stats = Arc::clone(stats);
                    let voucher = Arc::clone(&voucher);
                    let token = credential.token().clone();
                    handles.push(tokio::spawn(async move {
                        attempt(api.as_ref(), &token, &voucher, &stats).await;
                        Instant::now()
                    }));
                }
                let (elapsed, _) = tokio::select! {
                    joined = await_all(handles, None, start) => joined,
                    _ = shutdown_rx.recv() => {
                        warn!("Shutdown requested; abandoning the fire-once wave");
                        return Err(interrupted());
                    }
                };
                Ok(self.finish(mode, elapsed, credentials.len(), 0, stats))
            }
            RunMode::Sustained(duration) => {
                let deadline = start.checked_add(duration).unwrap_or(start);
                for credential in credentials {
                    let api = Arc::clone(&self.api);
                    let stats = Arc::clone(stats);
                    let voucher = Arc::clone(&voucher);
                    let token = credential.token().clone();
                    let mut loop_rx = shutdown_tx.subscribe();
                    handles.push(tokio::spawn(async move {
                        loop {
                            attempt(api.as_ref(), &token, &voucher, &stats).await;
                            if is_fired(&mut loop_rx) {
                                break;
                            }
                        }
                        Instant::now()
                    }));
                }
                // Loops spawned before a signal landed already hold it; resend
                // for the ones that subscribed after it.
                if is_fired(shutdown_rx) {
                    drop(shutdown_tx.send(()));
                }

                let timer_tx = shutdown_tx.clone();
                let timer = tokio::spawn(async move {
                    sleep_until(deadline).await;
                    drop(timer_tx.send(()));
                });

                let grace_deadline = deadline.checked_add(self.grace).unwrap_or(deadline);
                let (elapsed, stragglers) =
                    await_all(handles, Some(grace_deadline), start).await;
                timer.abort();
                Ok(self.finish(mode, elapsed, credentials.len(), stragglers, stats))
            }
        }
    }

    fn finish(
        &self,
        mode: RunMode,
        elapsed: Duration,
        tasks: usize,
        stragglers: usize,
        stats: &StatsAggregator,
    ) -> LoadRunSummary {
        info!(
            "Purchase run finished after {} ms: {} requests ({} grace)",
            elapsed.as_millis(),
            stats.total().count(),
            humanize(self.grace)
        );
        LoadRunSummary {
            mode,
            elapsed,
            tasks,
            stragglers,
        }
    }
}

const fn interrupted() -> ValidationError {
    ValidationError::Interrupted { action: "purchase" }
}

async fn attempt<P>(api: &P, token: &Token, voucher: &VoucherId, stats: &StatsAggregator) -> Outcome
where
    P: PurchaseApi + ?Sized,
{
    let started = Instant::now();
    let result = api.purchase(token, voucher).await;
    let latency = started.elapsed();
    let outcome = classify(&result);
    stats.record(outcome, latency);
    outcome
}

/// Completion barrier: waits for every task, tolerating a soft deadline.
///
/// Returns the time from `start` to the latest task exit and how many tasks
/// were still running at `soft_deadline`.
async fn await_all(
    handles: Vec<JoinHandle<Instant>>,
    soft_deadline: Option<Instant>,
    start: Instant,
) -> (Duration, usize) {
    let mut last_exit = start;
    let mut stragglers = 0_usize;
    for mut handle in handles {
        let joined = match soft_deadline {
            Some(deadline) => match timeout_at(deadline, &mut handle).await {
                Ok(joined) => joined,
                Err(_elapsed) => {
                    stragglers = stragglers.saturating_add(1);
                    handle.await
                }
            },
            None => handle.await,
        };
        match joined {
            Ok(exited_at) => last_exit = last_exit.max(exited_at),
            Err(err) => warn!("Purchase task ended abnormally: {}", err),
        }
    }
    if stragglers > 0 {
        warn!(
            "{} purchase loops outlived the grace period; waited for their last request",
            stragglers
        );
    }
    (last_exit.saturating_duration_since(start), stragglers)
}

fn humanize(duration: Duration) -> String {
    if duration.subsec_millis() == 0 {
        format!("{}s", duration.as_secs())
    } else {
        format!("{}ms", duration.as_millis())
    }
}
