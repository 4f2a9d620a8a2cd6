use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::{FlashArgs, PositiveUsize, parsers::parse_cache_address};
use crate::error::{ConfigError, ValidationError};

use super::types::{
    ApiConfig, CacheConfig, ConfigFile, DurationValue, HttpConfig, RunConfig, UsersConfig,
    VoucherConfig,
};

/// Fills every argument not given on the command line from the config file.
///
/// # Errors
///
/// Returns an error when a config value fails the same validation the CLI
/// flag would apply.
pub fn apply_config(
    args: &mut FlashArgs,
    matches: &ArgMatches,
    config: ConfigFile,
) -> Result<(), ConfigError> {
    if let Some(api) = config.api {
        apply_api(args, matches, api);
    }
    if let Some(users) = config.users {
        apply_users(args, matches, users)?;
    }
    if let Some(voucher) = config.voucher {
        apply_voucher(args, matches, voucher);
    }
    if let Some(cache) = config.cache {
        apply_cache(args, matches, cache)?;
    }
    if let Some(http) = config.http {
        apply_http(args, matches, http)?;
    }
    if let Some(run) = config.run {
        apply_run(args, matches, run)?;
    }
    Ok(())
}

fn apply_api(args: &mut FlashArgs, matches: &ArgMatches, api: ApiConfig) {
    if !is_cli(matches, "base_url")
        && let Some(url) = api.base_url
    {
        args.base_url = Some(url);
    }
    fill(&mut args.send_code_path, matches, "send_code_path", api.send_code_path);
    fill(&mut args.login_path, matches, "login_path", api.login_path);
    fill(&mut args.purchase_path, matches, "purchase_path", api.purchase_path);
    fill(&mut args.voucher_path, matches, "voucher_path", api.voucher_path);
}

fn apply_users(
    args: &mut FlashArgs,
    matches: &ArgMatches,
    users: UsersConfig,
) -> Result<(), ConfigError> {
    fill(&mut args.base_identity, matches, "base_identity", users.base_phone);
    if !is_cli(matches, "users")
        && let Some(count) = users.count
    {
        args.users = ensure_positive_usize(count, "users.count")?;
    }
    if !is_cli(matches, "batch_size")
        && let Some(batch_size) = users.batch_size
    {
        args.batch_size = ensure_positive_usize(batch_size, "users.batch_size")?;
    }
    if !is_cli(matches, "batch_delay")
        && let Some(delay) = users.batch_delay.as_ref()
    {
        args.batch_delay = duration(delay, "users.batch_delay")?;
    }
    fill(
        &mut args.credentials_file,
        matches,
        "credentials_file",
        users.credentials_file,
    );
    Ok(())
}

fn apply_voucher(args: &mut FlashArgs, matches: &ArgMatches, voucher: VoucherConfig) {
    if !is_cli(matches, "voucher")
        && let Some(id) = voucher.id
    {
        args.voucher = Some(id.into_string());
    }
    fill(&mut args.stock, matches, "stock", voucher.stock);
    fill(&mut args.shop_id, matches, "shop_id", voucher.shop_id);
    fill(&mut args.voucher_title, matches, "voucher_title", voucher.title);
    fill(&mut args.voucher_subtitle, matches, "voucher_subtitle", voucher.sub_title);
    fill(&mut args.voucher_rules, matches, "voucher_rules", voucher.rules);
    fill(&mut args.pay_value, matches, "pay_value", voucher.pay_value);
    fill(&mut args.actual_value, matches, "actual_value", voucher.actual_value);
    fill(&mut args.voucher_type, matches, "voucher_type", voucher.kind);
    if !is_cli(matches, "begin_time")
        && let Some(begin) = voucher.begin_time
    {
        args.begin_time = Some(begin);
    }
    if !is_cli(matches, "end_time")
        && let Some(end) = voucher.end_time
    {
        args.end_time = Some(end);
    }
}

fn apply_cache(
    args: &mut FlashArgs,
    matches: &ArgMatches,
    cache: CacheConfig,
) -> Result<(), ConfigError> {
    if !is_cli(matches, "cache_address")
        && let Some(address) = cache.address.as_deref()
    {
        args.cache_address =
            parse_cache_address(address).map_err(|err| invalid("cache.address", err))?;
    }
    if !is_set(matches, "cache_password")
        && let Some(password) = cache.password
    {
        args.cache_password = Some(password);
    }
    fill(&mut args.cache_db, matches, "cache_db", cache.db);
    fill(&mut args.code_key_prefix, matches, "code_key_prefix", cache.code_key_prefix);
    fill(&mut args.order_key_prefix, matches, "order_key_prefix", cache.order_key_prefix);
    fill(&mut args.stock_key_prefix, matches, "stock_key_prefix", cache.stock_key_prefix);
    fill(&mut args.reset_patterns, matches, "reset_patterns", cache.reset_patterns);
    if !is_cli(matches, "cache_timeout")
        && let Some(timeout) = cache.timeout.as_ref()
    {
        args.cache_timeout = duration(timeout, "cache.timeout")?;
    }
    Ok(())
}

fn apply_http(
    args: &mut FlashArgs,
    matches: &ArgMatches,
    http: HttpConfig,
) -> Result<(), ConfigError> {
    if !is_cli(matches, "request_timeout")
        && let Some(timeout) = http.timeout.as_ref()
    {
        args.request_timeout = duration(timeout, "http.timeout")?;
    }
    if !is_cli(matches, "connect_timeout")
        && let Some(timeout) = http.connect_timeout.as_ref()
    {
        args.connect_timeout = duration(timeout, "http.connect_timeout")?;
    }
    fill(&mut args.pool_max_idle, matches, "pool_max_idle", http.pool_max_idle);
    if !is_cli(matches, "pool_idle_timeout")
        && let Some(timeout) = http.pool_idle_timeout.as_ref()
    {
        args.pool_idle_timeout = duration(timeout, "http.pool_idle_timeout")?;
    }
    Ok(())
}

fn apply_run(args: &mut FlashArgs, matches: &ArgMatches, run: RunConfig) -> Result<(), ConfigError> {
    if !is_cli(matches, "duration")
        && let Some(window) = run.duration.as_ref()
    {
        args.duration = duration(window, "run.duration")?;
    }
    if !is_cli(matches, "grace")
        && let Some(grace) = run.grace.as_ref()
    {
        args.grace = duration(grace, "run.grace")?;
    }
    fill(&mut args.output_format, matches, "output_format", run.output_format);
    Ok(())
}

fn fill<T>(target: &mut T, matches: &ArgMatches, name: &str, value: Option<T>) {
    if !is_cli(matches, name)
        && let Some(value) = value
    {
        *target = value;
    }
}

fn is_cli(matches: &ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(ValueSource::CommandLine)
}

/// Environment values also beat the config file.
fn is_set(matches: &ArgMatches, name: &str) -> bool {
    matches!(
        matches.value_source(name),
        Some(ValueSource::CommandLine | ValueSource::EnvVariable)
    )
}

fn ensure_positive_usize(value: usize, field: &'static str) -> Result<PositiveUsize, ConfigError> {
    PositiveUsize::try_from(value).map_err(|err| invalid(field, err))
}

fn duration(value: &DurationValue, field: &'static str) -> Result<std::time::Duration, ConfigError> {
    value.to_duration().map_err(|err| invalid(field, err))
}

fn invalid(field: &'static str, source: ValidationError) -> ConfigError {
    ConfigError::InvalidField { field, source }
}
