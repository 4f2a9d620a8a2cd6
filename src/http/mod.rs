//! Shared HTTP client construction.
mod client;

pub use client::{ClientSettings, build_client};
