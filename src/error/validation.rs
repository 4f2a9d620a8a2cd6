use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Duration must not be empty.")]
    DurationEmpty,
    #[error("Invalid duration '{value}'.")]
    InvalidDurationFormat { value: String },
    #[error("Invalid duration '{value}': {source}")]
    InvalidDurationNumber {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Duration overflow.")]
    DurationOverflow,
    #[error("Invalid duration unit '{unit}'.")]
    InvalidDurationUnit { unit: String },
    #[error("Value must be >= {min}.")]
    ValueTooSmall { min: u64 },
    #[error("Invalid value: {source}")]
    InvalidNumber {
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Invalid boolean '{value}'.")]
    InvalidBoolean { value: String },
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("URL '{url}' must use http or https.")]
    UnsupportedUrlScheme { url: String },
    #[error("Missing base URL (set --base-url or api.base_url in config).")]
    MissingBaseUrl,
    #[error("Missing voucher id (set --voucher or voucher.id in config).")]
    MissingVoucher,
    #[error("Identity range overflows: base {base} + count {count}.")]
    IdentityRangeOverflow { base: u64, count: usize },
    #[error("Identity '{identity}' appears more than once.")]
    DuplicateIdentity { identity: String },
    #[error("Identity '{identity}' shares its token with another credential.")]
    SharedToken { identity: String },
    #[error("No credentials to drive the purchase run.")]
    NoCredentials,
    #[error("Invalid cache address '{value}'. Expected 'host:port'.")]
    InvalidCacheAddress { value: String },
    #[error("Invalid timestamp '{value}'. Expected YYYY-MM-DDTHH:MM:SS.")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("Interrupted before {action} finished.")]
    Interrupted { action: &'static str },
    #[error("Purchase successes ({successes}) exceed the available limit ({limit}).")]
    Oversold { successes: u64, limit: u64 },
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
