use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::report::{BucketReport, StatsReport};

/// Classification of one completed purchase attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// `success=true` with a positive integer order id.
    PurchaseSuccess,
    /// Well-formed response that did not yield an order.
    PurchaseRejected,
    /// Transport failure, timeout, or undecodable response.
    RequestFailure,
}

impl Outcome {
    pub const ALL: [Outcome; 3] = [
        Outcome::PurchaseSuccess,
        Outcome::PurchaseRejected,
        Outcome::RequestFailure,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Outcome::PurchaseSuccess => "purchase success",
            Outcome::PurchaseRejected => "purchase rejected",
            Outcome::RequestFailure => "request failed",
        }
    }
}

/// Counter and latency sum for one outcome class.
///
/// Each field is atomic on its own; a reader racing a writer may observe the
/// count bump before the latency sum does.
#[derive(Debug, Default)]
pub struct StatBucket {
    count: AtomicU64,
    latency_nanos: AtomicU64,
}

impl StatBucket {
    fn add(&self, latency_nanos: u64) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.latency_nanos
            .fetch_add(latency_nanos, Ordering::Relaxed);
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn latency_nanos(&self) -> u64 {
        self.latency_nanos.load(Ordering::Relaxed)
    }
}

/// Shared outcome counters for one run.
#[derive(Debug, Default)]
pub struct StatsAggregator {
    total: StatBucket,
    success: StatBucket,
    rejected: StatBucket,
    failure: StatBucket,
}

impl StatsAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one completed attempt. Never blocks.
    pub fn record(&self, outcome: Outcome, latency: Duration) {
        let nanos = u64::try_from(latency.as_nanos()).unwrap_or(u64::MAX);
        self.bucket(outcome).add(nanos);
        self.total.add(nanos);
    }

    #[must_use]
    pub const fn bucket(&self, outcome: Outcome) -> &StatBucket {
        match outcome {
            Outcome::PurchaseSuccess => &self.success,
            Outcome::PurchaseRejected => &self.rejected,
            Outcome::RequestFailure => &self.failure,
        }
    }

    #[must_use]
    pub const fn total(&self) -> &StatBucket {
        &self.total
    }

    /// Builds a report against the wall-clock duration of the run.
    ///
    /// Every bucket, including the per-outcome ones, divides by `elapsed`.
    /// Summed latency would overstate throughput whenever requests overlap.
    #[must_use]
    pub fn report(&self, elapsed: Duration) -> StatsReport {
        let success = BucketReport::from_bucket("purchase success", &self.success, elapsed);
        let rejected = BucketReport::from_bucket("purchase rejected", &self.rejected, elapsed);
        let failed = BucketReport::from_bucket("request failed", &self.failure, elapsed);
        let replied = BucketReport::from_parts(
            "replied",
            success.count.saturating_add(rejected.count),
            self.success
                .latency_nanos()
                .saturating_add(self.rejected.latency_nanos()),
            elapsed,
        );
        StatsReport {
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            total: BucketReport::from_bucket("total", &self.total, elapsed),
            replied,
            success,
            rejected,
            failed,
        }
    }
}
