use std::future::Future;
use std::sync::Arc;

use tracing::{info, warn};

use crate::api::HttpFlashSaleApi;
use crate::args::{Action, FlashArgs};
use crate::domain::{Credential, IdentityRange, RunMode, VoucherId};
use crate::error::{AppError, AppResult, ValidationError};
use crate::load::LoadDriver;
use crate::metrics::StatsAggregator;
use crate::provision::{AuthProvisioner, ProvisionReport};
use crate::shutdown::{ShutdownReceiver, ShutdownSender};
use crate::system::summary_output::{
    ProvisioningOutput, PurchaseOutput, RunOutput, print_output,
};

use super::context::{code_source, credential_store, http_api, provision_settings, voucher_id};

/// `provision`: log every identity in and append the sessions to the store.
pub(crate) async fn run_provision(args: &FlashArgs) -> AppResult<()> {
    let api = http_api(args)?;
    let report = provision(args, api).await?;
    let output = RunOutput {
        provisioning: Some(ProvisioningOutput::from_report(&report)),
        ..RunOutput::default()
    };
    print_output(&output, args.output_format)
}

/// Runs one phase of `action`, abandoning it when shutdown fires first.
pub(crate) async fn interruptible<T>(
    action: Action,
    shutdown_rx: &mut ShutdownReceiver,
    phase: impl Future<Output = AppResult<T>>,
) -> AppResult<T> {
    tokio::select! {
        result = phase => result,
        _ = shutdown_rx.recv() => {
            warn!("Shutdown requested; abandoning {}", action.as_str());
            Err(AppError::validation(ValidationError::Interrupted {
                action: action.as_str(),
            }))
        }
    }
}

/// `purchase`: drive a run with the credentials already in the store.
pub(crate) async fn run_purchase(
    args: &FlashArgs,
    shutdown_tx: &ShutdownSender,
    shutdown_rx: &mut ShutdownReceiver,
) -> AppResult<()> {
    let voucher = voucher_id(args)?;
    let api = http_api(args)?;
    let credentials = credential_store(args).load_non_empty()?;
    let purchase = purchase(args, api, &credentials, voucher, shutdown_tx, shutdown_rx).await?;
    finish(
        args,
        &RunOutput {
            purchase: Some(purchase),
            ..RunOutput::default()
        },
    )
}

/// `run`: provision, then purchase with the sessions just created.
pub(crate) async fn run_flash_sale(
    args: &FlashArgs,
    shutdown_tx: &ShutdownSender,
    shutdown_rx: &mut ShutdownReceiver,
) -> AppResult<()> {
    let voucher = voucher_id(args)?;
    let api = http_api(args)?;
    let report = interruptible(
        Action::Run,
        shutdown_rx,
        provision(args, Arc::clone(&api)),
    )
    .await?;
    let mut output = RunOutput {
        provisioning: Some(ProvisioningOutput::from_report(&report)),
        ..RunOutput::default()
    };
    if report.credentials.is_empty() {
        print_output(&output, args.output_format)?;
        return Err(AppError::validation(ValidationError::NoCredentials));
    }
    output.purchase = Some(
        purchase(args, api, &report.credentials, voucher, shutdown_tx, shutdown_rx).await?,
    );
    finish(args, &output)
}

async fn provision(args: &FlashArgs, api: Arc<HttpFlashSaleApi>) -> AppResult<ProvisionReport> {
    let store = credential_store(args);
    if args.fresh {
        store.remove()?;
    }
    let identities = IdentityRange::new(args.base_identity, args.users.get())?.identities();
    let provisioner = AuthProvisioner::new(api, code_source(args), provision_settings(args));
    let report = provisioner.provision(&identities).await?;
    if report.credentials.is_empty() {
        warn!("No identity was provisioned; nothing appended to {}", store.path().display());
    } else {
        store.append(&report.credentials)?;
    }
    Ok(report)
}

async fn purchase(
    args: &FlashArgs,
    api: Arc<HttpFlashSaleApi>,
    credentials: &[Credential],
    voucher: VoucherId,
    shutdown_tx: &ShutdownSender,
    shutdown_rx: &mut ShutdownReceiver,
) -> AppResult<PurchaseOutput> {
    let stats = Arc::new(StatsAggregator::new());
    let driver = LoadDriver::new(api, args.grace);
    let mode = RunMode::from_duration(args.duration);
    let summary = driver
        .run(credentials, &voucher, mode, &stats, shutdown_tx, shutdown_rx)
        .await?;
    let report = stats.report(summary.elapsed);
    Ok(PurchaseOutput::new(
        voucher.to_string(),
        &summary,
        report,
        args.stock,
    ))
}

/// Prints the report and turns a detected oversell into a failing exit.
fn finish(args: &FlashArgs, output: &RunOutput) -> AppResult<()> {
    print_output(output, args.output_format)?;
    if let Some(purchase) = output.purchase.as_ref() {
        let check = purchase.oversell;
        if check.oversold {
            return Err(AppError::validation(ValidationError::Oversold {
                successes: check.successes,
                limit: check.limit,
            }));
        }
        info!(
            "No oversell: {} successes within a limit of {}",
            check.successes, check.limit
        );
    }
    Ok(())
}
