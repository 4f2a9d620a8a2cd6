//! Flash-sale load harness.
//!
//! Provisions authenticated sessions against a flash-sale API in paced
//! batches, races them against one limited-stock voucher, and reports
//! outcome counts, throughput and whether more orders were granted than the
//! stock allows. The `flashload` binary is the primary interface; the
//! components below are public so they can be driven with other
//! collaborator implementations.
pub mod api;
mod app;
pub mod args;
pub mod config;
pub mod credentials;
pub mod domain;
pub mod entry;
pub mod error;
pub mod http;
pub mod load;
pub mod metrics;
pub mod provision;
pub mod shutdown;
mod shutdown_handlers;
mod system;
