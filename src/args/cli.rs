use clap::Parser;
use std::time::Duration;

use super::defaults::{
    DEFAULT_BASE_IDENTITY, DEFAULT_BATCH_DELAY, DEFAULT_BATCH_SIZE, DEFAULT_CACHE_ADDRESS,
    DEFAULT_CACHE_TIMEOUT, DEFAULT_CODE_KEY_PREFIX, DEFAULT_CONNECT_TIMEOUT,
    DEFAULT_CREDENTIALS_FILE, DEFAULT_DURATION, DEFAULT_GRACE, DEFAULT_LOGIN_PATH,
    DEFAULT_ORDER_KEY_PREFIX, DEFAULT_POOL_IDLE_TIMEOUT, DEFAULT_POOL_MAX_IDLE,
    DEFAULT_PURCHASE_PATH, DEFAULT_REQUEST_TIMEOUT, DEFAULT_RESET_PATTERNS, DEFAULT_SEND_CODE_PATH, DEFAULT_STOCK,
    DEFAULT_STOCK_KEY_PREFIX, DEFAULT_USER_COUNT, DEFAULT_VOUCHER_PATH,
};
use super::parsers::{
    parse_bool_env, parse_cache_address, parse_duration_arg, parse_positive_usize,
};
use super::types::{Action, OutputFormat, PositiveUsize};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Flash-sale load harness: provisions user sessions in paced batches, then races them against one limited-stock voucher and checks for oversell."
)]
pub struct FlashArgs {
    /// What to do (provision, purchase, run, add-voucher, reset)
    #[arg(value_enum, default_value = "run")]
    pub action: Action,

    /// Base URL of the flash-sale API (e.g. http://localhost:8081)
    #[arg(long = "base-url", short = 'u')]
    pub base_url: Option<String>,

    /// Path of the verification-code endpoint
    #[arg(long = "send-code-path", default_value = DEFAULT_SEND_CODE_PATH)]
    pub send_code_path: String,

    /// Path of the login endpoint
    #[arg(long = "login-path", default_value = DEFAULT_LOGIN_PATH)]
    pub login_path: String,

    /// Path prefix of the purchase endpoint; the voucher id is appended
    #[arg(long = "purchase-path", default_value = DEFAULT_PURCHASE_PATH)]
    pub purchase_path: String,

    /// Path of the add-voucher admin endpoint
    #[arg(long = "voucher-path", default_value = DEFAULT_VOUCHER_PATH)]
    pub voucher_path: String,

    /// First identity (phone number) of the generated range
    #[arg(long = "base-phone", default_value = DEFAULT_BASE_IDENTITY)]
    pub base_identity: u64,

    /// Number of identities to provision
    #[arg(long = "users", short = 'n', default_value = DEFAULT_USER_COUNT, value_parser = parse_positive_usize)]
    pub users: PositiveUsize,

    /// Identities logged in concurrently per batch
    #[arg(long = "batch-size", short = 'b', default_value = DEFAULT_BATCH_SIZE, value_parser = parse_positive_usize)]
    pub batch_size: PositiveUsize,

    /// Pause between provisioning batches (supports ms/s/m/h)
    #[arg(long = "batch-delay", default_value = DEFAULT_BATCH_DELAY, value_parser = parse_duration_arg)]
    pub batch_delay: Duration,

    /// CSV file holding identity,token rows
    #[arg(long = "credentials", default_value = DEFAULT_CREDENTIALS_FILE)]
    pub credentials_file: String,

    /// Remove the credential file before provisioning
    #[arg(long = "fresh")]
    pub fresh: bool,

    /// Id of the contested seckill voucher
    #[arg(long = "voucher")]
    pub voucher: Option<String>,

    /// Stock the voucher was created with
    #[arg(long = "stock", default_value = DEFAULT_STOCK)]
    pub stock: u64,

    /// Length of the purchase window; 0 sends one request per credential (supports ms/s/m/h)
    #[arg(long = "duration", short = 'd', default_value = DEFAULT_DURATION, value_parser = parse_duration_arg)]
    pub duration: Duration,

    /// Time allowed after the window for loops to stop (supports ms/s/m/h)
    #[arg(long = "grace", default_value = DEFAULT_GRACE, value_parser = parse_duration_arg)]
    pub grace: Duration,

    /// Shop that owns a voucher created with add-voucher
    #[arg(long = "shop-id", default_value = "1")]
    pub shop_id: u64,

    /// Title of a voucher created with add-voucher
    #[arg(long = "voucher-title", default_value = "100 off")]
    pub voucher_title: String,

    /// Subtitle of a voucher created with add-voucher
    #[arg(long = "voucher-subtitle", default_value = "Monday to Friday")]
    pub voucher_subtitle: String,

    /// Usage rules of a voucher created with add-voucher
    #[arg(long = "voucher-rules", default_value = "Valid storewide")]
    pub voucher_rules: String,

    /// Price paid for the voucher, in cents
    #[arg(long = "pay-value", default_value = "8000")]
    pub pay_value: u64,

    /// Face value of the voucher, in cents
    #[arg(long = "actual-value", default_value = "10000")]
    pub actual_value: u64,

    /// Voucher type code expected by the server
    #[arg(long = "voucher-type", default_value = "1")]
    pub voucher_type: u8,

    /// Sale start (YYYY-MM-DDTHH:MM:SS); defaults to now
    #[arg(long = "begin-time")]
    pub begin_time: Option<String>,

    /// Sale end (YYYY-MM-DDTHH:MM:SS); defaults to 30 days from now
    #[arg(long = "end-time")]
    pub end_time: Option<String>,

    /// Cache (RESP) address holding verification codes, as host:port
    #[arg(long = "cache-addr", default_value = DEFAULT_CACHE_ADDRESS, value_parser = parse_cache_address)]
    pub cache_address: String,

    /// Cache password
    #[arg(long = "cache-password", env = "FLASHLOAD_CACHE_PASSWORD", hide_env_values = true)]
    pub cache_password: Option<String>,

    /// Cache database index
    #[arg(long = "cache-db", default_value = "0")]
    pub cache_db: u32,

    /// Key prefix of cached verification codes
    #[arg(long = "code-key-prefix", default_value = DEFAULT_CODE_KEY_PREFIX)]
    pub code_key_prefix: String,

    /// Key prefix of the cached order set (used by reset)
    #[arg(long = "order-key-prefix", default_value = DEFAULT_ORDER_KEY_PREFIX)]
    pub order_key_prefix: String,

    /// Key prefix of the cached stock counter (used by reset)
    #[arg(long = "stock-key-prefix", default_value = DEFAULT_STOCK_KEY_PREFIX)]
    pub stock_key_prefix: String,

    /// Key pattern wiped by reset, e.g. leftover sessions and rate limits (repeatable)
    #[arg(long = "reset-pattern", default_values = DEFAULT_RESET_PATTERNS)]
    pub reset_patterns: Vec<String>,

    /// Connect and reply timeout for cache commands (supports ms/s/m/h)
    #[arg(long = "cache-timeout", default_value = DEFAULT_CACHE_TIMEOUT, value_parser = parse_duration_arg)]
    pub cache_timeout: Duration,

    /// Timeout for each HTTP request (supports ms/s/m/h)
    #[arg(long = "timeout", default_value = DEFAULT_REQUEST_TIMEOUT, value_parser = parse_duration_arg)]
    pub request_timeout: Duration,

    /// Timeout for establishing HTTP connections (supports ms/s/m/h)
    #[arg(long = "connect-timeout", default_value = DEFAULT_CONNECT_TIMEOUT, value_parser = parse_duration_arg)]
    pub connect_timeout: Duration,

    /// Idle connections kept per host
    #[arg(long = "pool-max-idle", default_value = DEFAULT_POOL_MAX_IDLE)]
    pub pool_max_idle: usize,

    /// How long idle connections stay pooled (supports ms/s/m/h)
    #[arg(long = "pool-idle-timeout", default_value = DEFAULT_POOL_IDLE_TIMEOUT, value_parser = parse_duration_arg)]
    pub pool_idle_timeout: Duration,

    /// Report format
    #[arg(long = "output-format", value_enum, default_value = "text")]
    pub output_format: OutputFormat,

    /// Path to config file (TOML/JSON). Defaults to ./flashload.toml or ./flashload.json if present.
    #[arg(long, short = 'c')]
    pub config: Option<String>,

    /// Enable verbose logging (sets log level to debug unless overridden by FLASHLOAD_LOG/RUST_LOG)
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Disable color output
    #[arg(long = "no-color", env = "NO_COLOR", value_parser = parse_bool_env)]
    pub no_color: bool,
}
