use chrono::{Local, NaiveDateTime, TimeDelta};
use serde::Serialize;
use tracing::{debug, info};

use crate::api::SeckillVoucher;
use crate::args::{FlashArgs, OutputFormat};
use crate::domain::VoucherId;
use crate::error::{AppResult, ValidationError};

use super::context::{cache, credential_store, http_api, voucher_id};

/// Timestamp layout the voucher endpoint accepts.
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
/// Sale length when no end time is given.
const DEFAULT_SALE_DAYS: i64 = 30;

#[derive(Debug, Serialize)]
struct AdminOutput {
    action: &'static str,
    voucher: String,
    detail: String,
}

/// `add-voucher`: create the seckill voucher using the first stored session.
pub(crate) async fn run_add_voucher(args: &FlashArgs) -> AppResult<()> {
    let api = http_api(args)?;
    let credentials = credential_store(args).load_non_empty()?;
    let Some(admin) = credentials.first() else {
        return Err(ValidationError::NoCredentials.into());
    };
    let voucher = seckill_voucher(args, Local::now().naive_local())?;
    let created = api.add_voucher(admin.token(), &voucher).await?;
    info!(
        "Created voucher '{}' with stock {} (id {})",
        voucher.title, voucher.stock, created
    );
    print_admin(
        args.output_format,
        &AdminOutput {
            action: "add-voucher",
            voucher: created.to_string(),
            detail: format!(
                "stock {} from {} to {}",
                voucher.stock, voucher.begin_time, voucher.end_time
            ),
        },
    )
}

/// `reset`: clear cached orders, restore cached stock, and wipe leftover
/// session and rate-limit keys so a repeat run can log in again.
pub(crate) async fn run_reset(args: &FlashArgs) -> AppResult<()> {
    let voucher = voucher_id(args)?;
    let (order_key, stock_key) = reset_keys(args, &voucher);
    let cache = cache(args);
    let orders = cache.del(&[order_key.as_str()]).await?;
    cache.set(&stock_key, &args.stock.to_string()).await?;
    let mut swept = 0_i64;
    for pattern in &args.reset_patterns {
        let keys = cache.keys(pattern).await?;
        let removed = cache.del(&keys).await?;
        debug!("Reset pattern {} removed {} of {} key(s)", pattern, removed, keys.len());
        swept = swept.saturating_add(removed);
    }
    info!(
        "Reset voucher {}: removed {} order key(s) and {} other key(s), {} = {}",
        voucher, orders, swept, stock_key, args.stock
    );
    print_admin(
        args.output_format,
        &AdminOutput {
            action: "reset",
            voucher: voucher.to_string(),
            detail: format!(
                "cleared {} and {} other key(s), stock {}",
                order_key, swept, args.stock
            ),
        },
    )
}

fn reset_keys(args: &FlashArgs, voucher: &VoucherId) -> (String, String) {
    (
        format!("{}{}", args.order_key_prefix, voucher),
        format!("{}{}", args.stock_key_prefix, voucher),
    )
}

fn seckill_voucher(args: &FlashArgs, now: NaiveDateTime) -> Result<SeckillVoucher, ValidationError> {
    let begin = match args.begin_time.as_deref() {
        Some(value) => parse_time(value)?,
        None => now,
    };
    let end = match args.end_time.as_deref() {
        Some(value) => parse_time(value)?,
        None => TimeDelta::try_days(DEFAULT_SALE_DAYS)
            .and_then(|days| begin.checked_add_signed(days))
            .unwrap_or(begin),
    };
    Ok(SeckillVoucher {
        shop_id: args.shop_id,
        title: args.voucher_title.clone(),
        sub_title: args.voucher_subtitle.clone(),
        rules: args.voucher_rules.clone(),
        pay_value: args.pay_value,
        actual_value: args.actual_value,
        kind: args.voucher_type,
        stock: args.stock,
        begin_time: begin.format(TIME_FORMAT).to_string(),
        end_time: end.format(TIME_FORMAT).to_string(),
    })
}

fn parse_time(value: &str) -> Result<NaiveDateTime, ValidationError> {
    NaiveDateTime::parse_from_str(value.trim(), TIME_FORMAT).map_err(|err| {
        ValidationError::InvalidTimestamp {
            value: value.to_owned(),
            source: err,
        }
    })
}

fn print_admin(format: OutputFormat, output: &AdminOutput) -> AppResult<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(output)?),
        OutputFormat::Text => println!(
            "{}: voucher {} ({})",
            output.action, output.voucher, output.detail
        ),
    }
    Ok(())
}
