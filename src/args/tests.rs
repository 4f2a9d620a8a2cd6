use super::parsers::{parse_bool_env, parse_cache_address, parse_duration_arg};
use super::test_support::parse_test_args;
use super::*;
use crate::error::{AppError, AppResult, ValidationError};
use std::time::Duration;

#[test]
fn parse_args_defaults() -> AppResult<()> {
    let args = parse_test_args(["flashload"])?;

    let expected_no_color = std::env::var("NO_COLOR")
        .ok()
        .and_then(|value| parse_bool_env(&value).ok())
        .unwrap_or(false);

    let checks = [
        (args.action == Action::Run, "Expected Action::Run"),
        (args.base_url.is_none(), "Expected base_url to be None"),
        (args.send_code_path == "/user/code", "Unexpected send_code_path"),
        (args.base_identity == 13_800_000_000, "Unexpected base_identity"),
        (args.users.get() == 1000, "Unexpected users"),
        (args.batch_size.get() == 100, "Unexpected batch_size"),
        (
            args.batch_delay == Duration::from_secs(1),
            "Unexpected batch_delay",
        ),
        (args.credentials_file == "auths.csv", "Unexpected credentials_file"),
        (!args.fresh, "Expected fresh to be false"),
        (args.voucher.is_none(), "Expected voucher to be None"),
        (args.stock == 100, "Unexpected stock"),
        (args.duration.is_zero(), "Expected fire-once duration"),
        (args.cache_address == "127.0.0.1:6379", "Unexpected cache_address"),
        (args.cache_db == 0, "Unexpected cache_db"),
        (
            args.request_timeout == Duration::from_secs(10),
            "Unexpected request_timeout",
        ),
        (
            args.output_format == OutputFormat::Text,
            "Expected text output",
        ),
        (args.no_color == expected_no_color, "Unexpected no_color"),
        (!args.verbose, "Expected verbose to be false"),
    ];
    for (ok, message) in checks {
        if !ok {
            return Err(AppError::validation(message));
        }
    }
    Ok(())
}

#[test]
fn parse_args_actions_and_overrides() -> AppResult<()> {
    let args = parse_test_args([
        "flashload",
        "purchase",
        "-u",
        "http://localhost:8081",
        "--voucher",
        "12",
        "--duration",
        "2m",
        "--batch-size",
        "2",
        "--output-format",
        "json",
    ])?;
    if args.action != Action::Purchase {
        return Err(AppError::validation("Expected Action::Purchase"));
    }
    if args.base_url.as_deref() != Some("http://localhost:8081") || args.voucher.as_deref() != Some("12") {
        return Err(AppError::validation("Unexpected base_url or voucher"));
    }
    if args.duration != Duration::from_secs(120) || args.batch_size.get() != 2 {
        return Err(AppError::validation("Unexpected duration or batch size"));
    }
    if args.output_format != OutputFormat::Json {
        return Err(AppError::validation("Expected json output"));
    }

    let args = parse_test_args(["flashload", "add-voucher"])?;
    if args.action != Action::AddVoucher {
        return Err(AppError::validation("Expected Action::AddVoucher"));
    }
    Ok(())
}

#[test]
fn parse_args_rejects_zero_batch_size() -> AppResult<()> {
    if parse_test_args(["flashload", "--batch-size", "0"]).is_ok() {
        return Err(AppError::validation("Expected zero batch size to fail"));
    }
    if parse_test_args(["flashload", "--cache-addr", "localhost"]).is_ok() {
        return Err(AppError::validation("Expected a port-less cache address to fail"));
    }
    Ok(())
}

#[test]
fn duration_units() -> AppResult<()> {
    let cases = [
        ("250ms", Duration::from_millis(250)),
        ("5", Duration::from_secs(5)),
        ("5s", Duration::from_secs(5)),
        ("2m", Duration::from_secs(120)),
        ("1h", Duration::from_secs(3600)),
        ("0", Duration::ZERO),
    ];
    for (input, expected) in cases {
        let parsed = parse_duration_arg(input)?;
        if parsed != expected {
            return Err(AppError::validation(format!(
                "{} parsed as {:?}",
                input, parsed
            )));
        }
    }
    Ok(())
}

#[test]
fn duration_errors() -> AppResult<()> {
    if !matches!(parse_duration_arg(""), Err(ValidationError::DurationEmpty)) {
        return Err(AppError::validation("Expected DurationEmpty"));
    }
    if !matches!(
        parse_duration_arg("ms"),
        Err(ValidationError::InvalidDurationFormat { .. })
    ) {
        return Err(AppError::validation("Expected InvalidDurationFormat"));
    }
    if !matches!(
        parse_duration_arg("3d"),
        Err(ValidationError::InvalidDurationUnit { .. })
    ) {
        return Err(AppError::validation("Expected InvalidDurationUnit"));
    }
    if !matches!(
        parse_duration_arg("18446744073709551615h"),
        Err(ValidationError::DurationOverflow)
    ) {
        return Err(AppError::validation("Expected DurationOverflow"));
    }
    Ok(())
}

#[test]
fn cache_address_requires_a_port() -> AppResult<()> {
    parse_cache_address("redis.local:6380")?;
    if parse_cache_address(":6379").is_ok() || parse_cache_address("host:port").is_ok() {
        return Err(AppError::validation("Expected invalid cache addresses to fail"));
    }
    Ok(())
}

#[test]
fn positive_usize_rejects_zero() {
    assert!(PositiveUsize::try_from(0).is_err());
    assert!(matches!("3".parse::<PositiveUsize>(), Ok(value) if value.get() == 3));
    assert!("x".parse::<PositiveUsize>().is_err());
}
