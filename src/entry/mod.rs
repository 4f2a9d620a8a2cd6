use std::ffi::OsString;
use std::path::Path;

use clap::{ArgMatches, CommandFactory, FromArgMatches};
use tracing::debug;

use crate::app::{
    interruptible, run_add_voucher, run_flash_sale, run_provision, run_purchase, run_reset,
};
use crate::args::{Action, FlashArgs};
use crate::config::{DEFAULT_CONFIG_FILES, apply_config, load_config};
use crate::error::{AppError, AppResult};
use crate::shutdown::shutdown_channel;
use crate::shutdown_handlers::setup_signal_shutdown_handler;
use crate::system::logger::init_logging;
use crate::system::summary_output::selection_lines;

/// Binary entry point: parse, configure, then run the chosen action.
///
/// # Errors
///
/// Returns the first fatal error of the action, including a detected oversell.
pub fn run() -> AppResult<()> {
    let Some((mut args, matches)) = parse_args()? else {
        return Ok(());
    };
    if let Some(config) = load_config(args.config.as_deref())? {
        apply_config(&mut args, &matches, config).map_err(AppError::config)?;
    }

    init_logging(args.verbose, args.no_color);
    for line in selection_lines(&args) {
        debug!("{}", line);
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_async(&args))
}

fn parse_args() -> AppResult<Option<(FlashArgs, ArgMatches)>> {
    let mut cmd = FlashArgs::command();
    let raw_args: Vec<OsString> = std::env::args_os().collect();

    if should_show_help(&raw_args) {
        cmd.print_help()?;
        println!();
        return Ok(None);
    }

    let matches = cmd.get_matches_from(raw_args);
    let args = FlashArgs::from_arg_matches(&matches)?;

    Ok(Some((args, matches)))
}

/// A bare invocation prints help unless a default config file is present.
fn should_show_help(raw_args: &[OsString]) -> bool {
    let treat_as_empty =
        matches!(raw_args, [] | [_]) || matches!(raw_args, [_, second] if second == "--");
    if !treat_as_empty {
        return false;
    }

    !DEFAULT_CONFIG_FILES
        .iter()
        .any(|path| Path::new(path).exists())
}

async fn run_async(args: &FlashArgs) -> AppResult<()> {
    let (shutdown_tx, _) = shutdown_channel();
    let signal_handle = setup_signal_shutdown_handler(&shutdown_tx);
    // Subscribed before any work so a signal during setup is never missed.
    let mut shutdown_rx = shutdown_tx.subscribe();

    // Purchase runs watch shutdown per phase: a sustained window still
    // reports, everything before it is abandoned.
    let action = args.action;
    let result = match action {
        Action::Provision => interruptible(action, &mut shutdown_rx, run_provision(args)).await,
        Action::Purchase => run_purchase(args, &shutdown_tx, &mut shutdown_rx).await,
        Action::Run => run_flash_sale(args, &shutdown_tx, &mut shutdown_rx).await,
        Action::AddVoucher => {
            interruptible(action, &mut shutdown_rx, run_add_voucher(args)).await
        }
        Action::Reset => interruptible(action, &mut shutdown_rx, run_reset(args)).await,
    };

    drop(shutdown_tx.send(()));
    signal_handle.await?;
    result
}
