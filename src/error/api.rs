use thiserror::Error;

/// Failures talking to the flash-sale API or its verification-code cache.
///
/// Every variant is confined to the identity or request that produced it;
/// callers turn it into a provisioning failure entry or a recorded outcome.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{endpoint} request failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("{endpoint} request timed out.")]
    Timeout { endpoint: &'static str },
    #[error("{endpoint} returned unexpected status {status}.")]
    UnexpectedStatus { endpoint: &'static str, status: u16 },
    #[error("Failed to decode {endpoint} response: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{endpoint} rejected the request: {message}")]
    Rejected {
        endpoint: &'static str,
        message: String,
    },
    #[error("No verification code cached for '{identity}'.")]
    CodeMissing { identity: String },
    #[error("Cache error: {message}")]
    Cache { message: String },
    #[error("Provisioning task for '{identity}' aborted: {message}")]
    TaskAborted { identity: String, message: String },
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}

impl ApiError {
    /// Maps a `reqwest` failure onto the transport taxonomy.
    pub(crate) fn from_reqwest(endpoint: &'static str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return ApiError::Timeout { endpoint };
        }
        ApiError::Transport {
            endpoint,
            source: Box::new(err),
        }
    }

    pub(crate) fn cache_io(err: &std::io::Error) -> Self {
        ApiError::Cache {
            message: err.to_string(),
        }
    }
}
