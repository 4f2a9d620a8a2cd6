use serde::Serialize;

use crate::args::{FlashArgs, OutputFormat};
use crate::error::AppResult;
use crate::load::LoadRunSummary;
use crate::metrics::{OversellCheck, StatsReport, format_x100};
use crate::provision::ProvisionReport;

pub(crate) fn selection_lines(args: &FlashArgs) -> Vec<String> {
    vec![
        "Selections:".to_owned(),
        format!("action: {}", args.action.as_str()),
        format!("base_url: {}", args.base_url.as_deref().unwrap_or("none")),
        format!("users: {} from {}", args.users.get(), args.base_identity),
        format!(
            "batch: {} every {} ms",
            args.batch_size.get(),
            args.batch_delay.as_millis()
        ),
        format!("credentials: {}", args.credentials_file),
        format!("voucher: {}", args.voucher.as_deref().unwrap_or("none")),
        format!("stock: {}", args.stock),
        format!("duration_ms: {}", args.duration.as_millis()),
        format!("cache: {} db {}", args.cache_address, args.cache_db),
        format!("request_timeout_ms: {}", args.request_timeout.as_millis()),
        format!("pool_max_idle: {}", args.pool_max_idle),
    ]
}

/// Everything one invocation reports, in both output formats.
#[derive(Debug, Default, Serialize)]
pub(crate) struct RunOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) provisioning: Option<ProvisioningOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) purchase: Option<PurchaseOutput>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ProvisioningOutput {
    pub(crate) requested: usize,
    pub(crate) provisioned: usize,
    pub(crate) failures: Vec<FailureLine>,
}

#[derive(Debug, Serialize)]
pub(crate) struct FailureLine {
    pub(crate) identity: String,
    pub(crate) error: String,
}

impl ProvisioningOutput {
    pub(crate) fn from_report(report: &ProvisionReport) -> Self {
        Self {
            requested: report.len(),
            provisioned: report.credentials.len(),
            failures: report
                .failures
                .iter()
                .map(|failure| FailureLine {
                    identity: failure.identity.to_string(),
                    error: failure.error.to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct PurchaseOutput {
    pub(crate) mode: &'static str,
    pub(crate) voucher: String,
    pub(crate) credentials: usize,
    pub(crate) stragglers: usize,
    pub(crate) report: StatsReport,
    pub(crate) oversell: OversellCheck,
}

impl PurchaseOutput {
    pub(crate) fn new(
        voucher: String,
        summary: &LoadRunSummary,
        report: StatsReport,
        stock: u64,
    ) -> Self {
        let oversell = report.check_oversell(stock, summary.tasks);
        Self {
            mode: summary.mode.as_str(),
            voucher,
            credentials: summary.tasks,
            stragglers: summary.stragglers,
            report,
            oversell,
        }
    }
}

pub(crate) fn print_output(output: &RunOutput, format: OutputFormat) -> AppResult<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(output)?),
        OutputFormat::Text => print!("{}", render_text(output)),
    }
    Ok(())
}

fn render_text(output: &RunOutput) -> String {
    let mut lines = Vec::new();
    if let Some(provisioning) = output.provisioning.as_ref() {
        lines.push(format!(
            "Provisioned: {} of {} identities",
            provisioning.provisioned, provisioning.requested
        ));
        if !provisioning.failures.is_empty() {
            lines.push(format!("Failed identities ({}):", provisioning.failures.len()));
            for failure in &provisioning.failures {
                lines.push(format!("  {}: {}", failure.identity, failure.error));
            }
        }
    }
    if let Some(purchase) = output.purchase.as_ref() {
        lines.push(format!(
            "Purchase run ({}) on voucher {} with {} credentials",
            purchase.mode, purchase.voucher, purchase.credentials
        ));
        lines.push(format!("Elapsed: {} ms", purchase.report.elapsed_ms));
        for bucket in purchase.report.buckets() {
            lines.push(format!(
                "{:<18} {:>8}  {:>10} req/s  mean {:>10} ms  avg response {:>10} ms",
                bucket.name,
                bucket.count,
                format_x100(bucket.throughput_x100),
                format_x100(bucket.mean_latency_ms_x100),
                format_x100(bucket.avg_response_ms_x100)
            ));
        }
        if purchase.stragglers > 0 {
            lines.push(format!(
                "Stragglers past the grace period: {}",
                purchase.stragglers
            ));
        }
        let verdict = if purchase.oversell.oversold {
            "OVERSOLD"
        } else {
            "ok"
        };
        lines.push(format!(
            "Oversell check: {} ({} successes, limit {})",
            verdict, purchase.oversell.successes, purchase.oversell.limit
        ));
    }
    let mut text = lines.join("\n");
    text.push('\n');
    text
}
