pub(crate) const DEFAULT_USER_AGENT: &str = concat!("flashload/", env!("CARGO_PKG_VERSION"));

pub(super) const DEFAULT_SEND_CODE_PATH: &str = "/user/code";
pub(super) const DEFAULT_LOGIN_PATH: &str = "/user/login";
pub(super) const DEFAULT_PURCHASE_PATH: &str = "/voucher-order/seckill";
pub(super) const DEFAULT_VOUCHER_PATH: &str = "/voucher/seckill";

pub(super) const DEFAULT_BASE_IDENTITY: &str = "13800000000";
pub(super) const DEFAULT_USER_COUNT: &str = "1000";
pub(super) const DEFAULT_BATCH_SIZE: &str = "100";
pub(super) const DEFAULT_BATCH_DELAY: &str = "1s";
pub(super) const DEFAULT_CREDENTIALS_FILE: &str = "auths.csv";

pub(super) const DEFAULT_STOCK: &str = "100";
pub(super) const DEFAULT_DURATION: &str = "0";
pub(super) const DEFAULT_GRACE: &str = "1s";

pub(super) const DEFAULT_CACHE_ADDRESS: &str = "127.0.0.1:6379";
pub(super) const DEFAULT_CODE_KEY_PREFIX: &str = "login:code:";
pub(super) const DEFAULT_ORDER_KEY_PREFIX: &str = "seckill:order:";
pub(super) const DEFAULT_STOCK_KEY_PREFIX: &str = "seckill:stock:";
pub(super) const DEFAULT_RESET_PATTERNS: [&str; 3] = ["login:*", "rate:*", "{rate:*"];
pub(super) const DEFAULT_CACHE_TIMEOUT: &str = "3s";

pub(super) const DEFAULT_REQUEST_TIMEOUT: &str = "10s";
pub(super) const DEFAULT_CONNECT_TIMEOUT: &str = "5s";
pub(super) const DEFAULT_POOL_MAX_IDLE: &str = "1024";
pub(super) const DEFAULT_POOL_IDLE_TIMEOUT: &str = "90s";
