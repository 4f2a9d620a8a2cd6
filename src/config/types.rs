use std::time::Duration;

use serde::Deserialize;

use crate::args::{OutputFormat, parse_duration_arg};
use crate::error::ValidationError;

/// Root of `flashload.toml` / `flashload.json`. Every field is optional.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub api: Option<ApiConfig>,
    pub users: Option<UsersConfig>,
    pub voucher: Option<VoucherConfig>,
    pub cache: Option<CacheConfig>,
    pub http: Option<HttpConfig>,
    pub run: Option<RunConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiConfig {
    pub base_url: Option<String>,
    #[serde(alias = "auth_code")]
    pub send_code_path: Option<String>,
    #[serde(alias = "login")]
    pub login_path: Option<String>,
    #[serde(alias = "purchase")]
    pub purchase_path: Option<String>,
    #[serde(alias = "voucher")]
    pub voucher_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UsersConfig {
    pub base_phone: Option<u64>,
    #[serde(alias = "user_count")]
    pub count: Option<usize>,
    pub batch_size: Option<usize>,
    pub batch_delay: Option<DurationValue>,
    #[serde(alias = "auth_file_name")]
    pub credentials_file: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VoucherConfig {
    pub id: Option<IdValue>,
    pub stock: Option<u64>,
    pub shop_id: Option<u64>,
    pub title: Option<String>,
    pub sub_title: Option<String>,
    pub rules: Option<String>,
    pub pay_value: Option<u64>,
    pub actual_value: Option<u64>,
    #[serde(rename = "type")]
    pub kind: Option<u8>,
    pub begin_time: Option<String>,
    pub end_time: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CacheConfig {
    pub address: Option<String>,
    pub password: Option<String>,
    pub db: Option<u32>,
    pub code_key_prefix: Option<String>,
    pub order_key_prefix: Option<String>,
    pub stock_key_prefix: Option<String>,
    pub reset_patterns: Option<Vec<String>>,
    pub timeout: Option<DurationValue>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HttpConfig {
    pub timeout: Option<DurationValue>,
    pub connect_timeout: Option<DurationValue>,
    pub pool_max_idle: Option<usize>,
    pub pool_idle_timeout: Option<DurationValue>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RunConfig {
    #[serde(alias = "purchase_duration")]
    pub duration: Option<DurationValue>,
    pub grace: Option<DurationValue>,
    pub output_format: Option<OutputFormat>,
}

/// Durations written either as bare seconds or with a unit suffix.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(&self) -> Result<Duration, ValidationError> {
        match self {
            DurationValue::Seconds(secs) => Ok(Duration::from_secs(*secs)),
            DurationValue::Text(text) => parse_duration_arg(text),
        }
    }
}

/// Identifiers the server hands out as numbers but that may be quoted.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IdValue {
    Number(u64),
    Text(String),
}

impl IdValue {
    #[must_use]
    pub fn into_string(self) -> String {
        match self {
            IdValue::Number(id) => id.to_string(),
            IdValue::Text(text) => text,
        }
    }
}
