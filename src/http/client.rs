use std::time::Duration;

use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::debug;

use crate::args::{DEFAULT_USER_AGENT, FlashArgs};
use crate::error::AppResult;

/// Timeouts and pool limits for the one client every task shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientSettings {
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout: Duration,
}

impl ClientSettings {
    #[must_use]
    pub const fn from_args(args: &FlashArgs) -> Self {
        Self {
            request_timeout: args.request_timeout,
            connect_timeout: args.connect_timeout,
            pool_max_idle_per_host: args.pool_max_idle,
            pool_idle_timeout: args.pool_idle_timeout,
        }
    }
}

/// Builds the pooled client used for provisioning and purchasing.
///
/// Requests default to JSON bodies; a zero timeout disables that timeout.
///
/// # Errors
///
/// Returns an error when reqwest cannot initialise its TLS backend.
pub fn build_client(settings: &ClientSettings) -> AppResult<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));

    let mut client_builder = Client::builder()
        .user_agent(DEFAULT_USER_AGENT)
        .default_headers(headers)
        .pool_max_idle_per_host(settings.pool_max_idle_per_host)
        .pool_idle_timeout(Some(settings.pool_idle_timeout));

    if !settings.request_timeout.is_zero() {
        client_builder = client_builder.timeout(settings.request_timeout);
    }
    if !settings.connect_timeout.is_zero() {
        client_builder = client_builder.connect_timeout(settings.connect_timeout);
    }

    debug!(
        "Building HTTP client: timeout {:?}, connect timeout {:?}, {} idle per host",
        settings.request_timeout, settings.connect_timeout, settings.pool_max_idle_per_host
    );
    Ok(client_builder.build()?)
}
