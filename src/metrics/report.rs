use std::fmt::{self, Write as _};
use std::time::Duration;

use serde::Serialize;

use super::stats::StatBucket;

/// Fixed-point scale used for rates and millisecond values.
const SCALE_X100: u128 = 100;
/// Nanoseconds per second.
const NS_PER_SEC: u128 = 1_000_000_000;
/// Nanoseconds per millisecond.
const NS_PER_MS: u128 = 1_000_000;
/// Divisor for splitting `x100` values into whole and fractional parts.
const PERCENT_DIVISOR: u64 = 100;

/// Rates for one bucket. `_x100` fields carry two implied decimals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketReport {
    pub name: &'static str,
    pub count: u64,
    /// Completed requests per second of run time.
    pub throughput_x100: u64,
    /// `1000 / throughput`, in milliseconds.
    pub mean_latency_ms_x100: u64,
    /// Summed response latency divided by count, in milliseconds.
    pub avg_response_ms_x100: u64,
}

impl BucketReport {
    pub(super) fn from_bucket(name: &'static str, bucket: &StatBucket, elapsed: Duration) -> Self {
        Self::from_parts(name, bucket.count(), bucket.latency_nanos(), elapsed)
    }

    pub(super) fn from_parts(
        name: &'static str,
        count: u64,
        latency_nanos: u64,
        elapsed: Duration,
    ) -> Self {
        if count == 0 {
            return Self {
                name,
                count,
                throughput_x100: 0,
                mean_latency_ms_x100: 0,
                avg_response_ms_x100: 0,
            };
        }
        let elapsed_ns = elapsed.as_nanos().max(1);
        let count_wide = u128::from(count);

        let throughput_x100 = count_wide
            .saturating_mul(SCALE_X100)
            .saturating_mul(NS_PER_SEC)
            .checked_div(elapsed_ns)
            .unwrap_or(0);
        // 1000 / (count / secs) == elapsed_ms / count
        let mean_latency_ms_x100 = elapsed_ns
            .saturating_mul(SCALE_X100)
            .checked_div(NS_PER_MS)
            .and_then(|scaled_ms| scaled_ms.checked_div(count_wide))
            .unwrap_or(0);
        let avg_response_ms_x100 = u128::from(latency_nanos)
            .saturating_mul(SCALE_X100)
            .checked_div(NS_PER_MS.saturating_mul(count_wide))
            .unwrap_or(0);

        Self {
            name,
            count,
            throughput_x100: clamp_u64(throughput_x100),
            mean_latency_ms_x100: clamp_u64(mean_latency_ms_x100),
            avg_response_ms_x100: clamp_u64(avg_response_ms_x100),
        }
    }
}

impl fmt::Display for BucketReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.name)?;
        writeln!(
            f,
            "  count: {} ({} req/s)",
            self.count,
            format_x100(self.throughput_x100)
        )?;
        writeln!(
            f,
            "  mean latency: {} ms",
            format_x100(self.mean_latency_ms_x100)
        )?;
        write!(
            f,
            "  avg response: {} ms",
            format_x100(self.avg_response_ms_x100)
        )
    }
}

/// Snapshot of every bucket against one elapsed duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsReport {
    pub elapsed_ms: u64,
    pub total: BucketReport,
    pub replied: BucketReport,
    pub success: BucketReport,
    pub rejected: BucketReport,
    pub failed: BucketReport,
}

impl StatsReport {
    #[must_use]
    pub fn buckets(&self) -> [&BucketReport; 5] {
        [
            &self.total,
            &self.replied,
            &self.success,
            &self.rejected,
            &self.failed,
        ]
    }

    /// Compares purchase successes with what the sale could legally grant.
    #[must_use]
    pub fn check_oversell(&self, stock: u64, credentials: usize) -> OversellCheck {
        let credentials = u64::try_from(credentials).unwrap_or(u64::MAX);
        let limit = stock.min(credentials);
        OversellCheck {
            successes: self.success.count,
            limit,
            oversold: self.success.count > limit,
        }
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ignored = writeln!(out, "elapsed: {} ms", self.elapsed_ms);
        for bucket in self.buckets() {
            let _ignored = writeln!(out, "{}", bucket);
        }
        out
    }
}

/// Result of comparing successes against `min(stock, credentials)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OversellCheck {
    pub successes: u64,
    pub limit: u64,
    pub oversold: bool,
}

pub(crate) fn format_x100(value: u64) -> String {
    format!(
        "{}.{:02}",
        value / PERCENT_DIVISOR,
        value % PERCENT_DIVISOR
    )
}

fn clamp_u64(value: u128) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}
