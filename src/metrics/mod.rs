//! Outcome statistics: lock-free recording and fixed-point reports.
mod report;
mod stats;


pub use report::{BucketReport, OversellCheck, StatsReport};
pub use stats::{Outcome, StatBucket, StatsAggregator};
pub(crate) use report::format_x100;
