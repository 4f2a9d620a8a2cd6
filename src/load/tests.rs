use super::*;
use crate::api::test_support::{FixedCodes, PurchaseScript, ScriptedAuth, ScriptedPurchase};
use crate::args::PositiveUsize;
use crate::domain::{Identity, IdentityRange};
use crate::error::{AppError, AppResult};
use crate::metrics::Outcome;
use crate::provision::{AuthProvisioner, ProvisionSettings};
use crate::shutdown::shutdown_channel;

const RTT: Duration = Duration::from_millis(20);

fn credentials(count: usize) -> Vec<Credential> {
    (0..count)
        .map(|idx| {
            Credential::new(
                Identity::new(format!("1800000000{}", idx)),
                Token::new(format!("token-{}", idx)),
            )
        })
        .collect()
}

fn voucher() -> VoucherId {
    VoucherId::new("7")
}

fn outcome_sum(stats: &StatsAggregator) -> u64 {
    Outcome::ALL
        .iter()
        .map(|outcome| stats.bucket(*outcome).count())
        .sum()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn fire_once_sends_exactly_one_request_per_credential() -> AppResult<()> {
    let api = Arc::new(ScriptedPurchase::new(RTT, PurchaseScript::Stock(3)));
    let driver = LoadDriver::new(Arc::clone(&api), DEFAULT_GRACE);
    let stats = Arc::new(StatsAggregator::new());
    let (shutdown_tx, mut shutdown_rx) = shutdown_channel();

    let summary = driver
        .run(
            &credentials(5),
            &voucher(),
            RunMode::FireOnce,
            &stats,
            &shutdown_tx,
            &mut shutdown_rx,
        )
        .await?;

    if api.requests() != 5 || stats.total().count() != 5 {
        return Err(AppError::validation(format!(
            "expected 5 requests, saw {} dispatched and {} recorded",
            api.requests(),
            stats.total().count()
        )));
    }
    if stats.bucket(Outcome::PurchaseSuccess).count() != 3
        || stats.bucket(Outcome::PurchaseRejected).count() != 2
    {
        return Err(AppError::validation("stock of 3 should yield 3 orders"));
    }
    if summary.tasks != 5 || summary.stragglers != 0 || summary.elapsed < RTT {
        return Err(AppError::validation(format!("unexpected summary: {:?}", summary)));
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn each_task_uses_only_its_own_token() -> AppResult<()> {
    let api = Arc::new(ScriptedPurchase::new(RTT, PurchaseScript::Stock(100)));
    let driver = LoadDriver::new(Arc::clone(&api), DEFAULT_GRACE);
    let stats = Arc::new(StatsAggregator::new());
    let (shutdown_tx, mut shutdown_rx) = shutdown_channel();

    driver
        .run(
            &credentials(4),
            &voucher(),
            RunMode::FireOnce,
            &stats,
            &shutdown_tx,
            &mut shutdown_rx,
        )
        .await?;

    let mut seen = api.tokens();
    seen.sort_unstable();
    if seen != ["token-0", "token-1", "token-2", "token-3"] {
        return Err(AppError::validation(format!("tokens reused or lost: {:?}", seen)));
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sustained_run_stops_dispatching_after_the_window() -> AppResult<()> {
    let window = Duration::from_millis(200);
    let api = Arc::new(ScriptedPurchase::new(RTT, PurchaseScript::Stock(1)));
    let driver = LoadDriver::new(Arc::clone(&api), DEFAULT_GRACE);
    let stats = Arc::new(StatsAggregator::new());
    let (shutdown_tx, mut shutdown_rx) = shutdown_channel();

    let started = Instant::now();
    let summary = driver
        .run(
            &credentials(3),
            &voucher(),
            RunMode::Sustained(window),
            &stats,
            &shutdown_tx,
            &mut shutdown_rx,
        )
        .await?;

    let Some(last) = api.last_dispatch() else {
        return Err(AppError::validation("no request was dispatched"));
    };
    let slack = Duration::from_millis(100);
    if last.saturating_duration_since(started) > window + RTT + slack {
        return Err(AppError::validation(format!(
            "dispatch continued {:?} after start",
            last.saturating_duration_since(started)
        )));
    }
    // 3 loops of 20 ms requests over 200 ms leave far more than 3 requests.
    if api.requests() <= 3 {
        return Err(AppError::validation("loops did not keep purchasing"));
    }
    if summary.elapsed < window || summary.stragglers != 0 {
        return Err(AppError::validation(format!("unexpected summary: {:?}", summary)));
    }
    if stats.bucket(Outcome::PurchaseSuccess).count() != 1 {
        return Err(AppError::validation("stock of 1 should yield one order"));
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn early_shutdown_ends_a_sustained_run() -> AppResult<()> {
    let api = Arc::new(ScriptedPurchase::new(RTT, PurchaseScript::Stock(0)));
    let driver = LoadDriver::new(Arc::clone(&api), DEFAULT_GRACE);
    let stats = Arc::new(StatsAggregator::new());
    let (shutdown_tx, mut shutdown_rx) = shutdown_channel();

    let stopper = shutdown_tx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(60)).await;
        drop(stopper.send(()));
    });

    let summary = driver
        .run(
            &credentials(2),
            &voucher(),
            RunMode::Sustained(Duration::from_secs(30)),
            &stats,
            &shutdown_tx,
            &mut shutdown_rx,
        )
        .await?;

    if summary.elapsed > Duration::from_secs(5) {
        return Err(AppError::validation(format!(
            "run ignored shutdown: {:?}",
            summary.elapsed
        )));
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_attempt_lands_in_exactly_one_bucket() -> AppResult<()> {
    let api = Arc::new(ScriptedPurchase::new(
        Duration::from_millis(5),
        PurchaseScript::Stock(10),
    ));
    let driver = LoadDriver::new(Arc::clone(&api), DEFAULT_GRACE);
    let stats = Arc::new(StatsAggregator::new());
    let (shutdown_tx, mut shutdown_rx) = shutdown_channel();

    driver
        .run(
            &credentials(8),
            &voucher(),
            RunMode::Sustained(Duration::from_millis(150)),
            &stats,
            &shutdown_tx,
            &mut shutdown_rx,
        )
        .await?;

    let total = stats.total().count();
    if outcome_sum(&stats) != total {
        return Err(AppError::validation(format!(
            "outcomes sum to {} but total is {}",
            outcome_sum(&stats),
            total
        )));
    }
    if total != u64::try_from(api.requests()).unwrap_or(u64::MAX) {
        return Err(AppError::validation("a dispatched request went unrecorded"));
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn timeouts_count_as_failures() -> AppResult<()> {
    let api = Arc::new(ScriptedPurchase::new(RTT, PurchaseScript::Timeout));
    let driver = LoadDriver::new(Arc::clone(&api), DEFAULT_GRACE);
    let stats = Arc::new(StatsAggregator::new());
    let (shutdown_tx, mut shutdown_rx) = shutdown_channel();

    driver
        .run(
            &credentials(3),
            &voucher(),
            RunMode::FireOnce,
            &stats,
            &shutdown_tx,
            &mut shutdown_rx,
        )
        .await?;

    if stats.bucket(Outcome::RequestFailure).count() != 3 || stats.total().count() != 3 {
        return Err(AppError::validation("timeouts should all be failures"));
    }
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn empty_and_duplicate_credentials_are_rejected() -> AppResult<()> {
    let api = Arc::new(ScriptedPurchase::new(RTT, PurchaseScript::Stock(1)));
    let driver = LoadDriver::new(api, DEFAULT_GRACE);
    let stats = Arc::new(StatsAggregator::new());
    let (shutdown_tx, mut shutdown_rx) = shutdown_channel();

    match driver
        .run(
            &[],
            &voucher(),
            RunMode::FireOnce,
            &stats,
            &shutdown_tx,
            &mut shutdown_rx,
        )
        .await
    {
        Err(ValidationError::NoCredentials) => {}
        other => return Err(AppError::validation(format!("expected NoCredentials, got {:?}", other))),
    }

    let mut shared = credentials(2);
    shared.push(Credential::new(Identity::new("18000000009"), Token::new("token-0")));
    match driver
        .run(
            &shared,
            &voucher(),
            RunMode::FireOnce,
            &stats,
            &shutdown_tx,
            &mut shutdown_rx,
        )
        .await
    {
        Err(ValidationError::SharedToken { .. }) => {}
        other => return Err(AppError::validation(format!("expected SharedToken, got {:?}", other))),
    }

    let mut twice = credentials(2);
    twice.push(Credential::new(Identity::new("18000000000"), Token::new("other")));
    match driver
        .run(
            &twice,
            &voucher(),
            RunMode::FireOnce,
            &stats,
            &shutdown_tx,
            &mut shutdown_rx,
        )
        .await
    {
        Err(ValidationError::DuplicateIdentity { .. }) => {}
        other => return Err(AppError::validation(format!("expected duplicate error, got {:?}", other))),
    }
    if stats.total().count() != 0 {
        return Err(AppError::validation("rejected runs must not dispatch"));
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn provisioned_sessions_drive_a_fire_once_wave() -> AppResult<()> {
    let provisioner = AuthProvisioner::new(
        Arc::new(ScriptedAuth::new(Duration::from_millis(5))),
        Arc::new(FixedCodes("123456")),
        ProvisionSettings {
            batch_size: PositiveUsize::try_from(2)?,
            batch_delay: Duration::from_millis(10),
        },
    );
    let identities = IdentityRange::new(18_000_000_000, 5)?.identities();
    let report = provisioner.provision(&identities).await?;
    if report.credentials.len() != 5 {
        return Err(AppError::validation("all five sessions should provision"));
    }

    let api = Arc::new(ScriptedPurchase::new(RTT, PurchaseScript::Stock(2)));
    let driver = LoadDriver::new(Arc::clone(&api), DEFAULT_GRACE);
    let stats = Arc::new(StatsAggregator::new());
    let (shutdown_tx, mut shutdown_rx) = shutdown_channel();
    let summary = driver
        .run(
            &report.credentials,
            &voucher(),
            RunMode::FireOnce,
            &stats,
            &shutdown_tx,
            &mut shutdown_rx,
        )
        .await?;

    let check = stats.report(summary.elapsed).check_oversell(2, report.credentials.len());
    if check.oversold || check.successes != 2 || stats.total().count() != 5 {
        return Err(AppError::validation(format!("unexpected oversell check: {:?}", check)));
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn shutdown_before_start_dispatches_nothing() -> AppResult<()> {
    for mode in [RunMode::FireOnce, RunMode::Sustained(Duration::from_secs(30))] {
        let api = Arc::new(ScriptedPurchase::new(RTT, PurchaseScript::Stock(5)));
        let driver = LoadDriver::new(Arc::clone(&api), DEFAULT_GRACE);
        let stats = Arc::new(StatsAggregator::new());
        let (shutdown_tx, mut shutdown_rx) = shutdown_channel();
        // Fired while credentials were still being prepared.
        if shutdown_tx.send(()).is_err() {
            return Err(AppError::validation("Failed to send shutdown"));
        }

        let started = Instant::now();
        match driver
            .run(
                &credentials(3),
                &voucher(),
                mode,
                &stats,
                &shutdown_tx,
                &mut shutdown_rx,
            )
            .await
        {
            Err(ValidationError::Interrupted { .. }) => {}
            other => {
                return Err(AppError::validation(format!(
                    "{} run should be interrupted, got {:?}",
                    mode.as_str(),
                    other
                )));
            }
        }
        if api.requests() != 0 || stats.total().count() != 0 {
            return Err(AppError::validation(format!(
                "{} run dispatched {} requests after shutdown",
                mode.as_str(),
                api.requests()
            )));
        }
        if started.elapsed() > Duration::from_secs(1) {
            return Err(AppError::validation("interrupted run should return at once"));
        }
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn shutdown_during_a_fire_once_wave_abandons_it() -> AppResult<()> {
    let api = Arc::new(ScriptedPurchase::new(
        Duration::from_secs(10),
        PurchaseScript::Stock(5),
    ));
    let driver = LoadDriver::new(Arc::clone(&api), DEFAULT_GRACE);
    let stats = Arc::new(StatsAggregator::new());
    let (shutdown_tx, mut shutdown_rx) = shutdown_channel();

    let stopper = shutdown_tx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        drop(stopper.send(()));
    });

    let started = Instant::now();
    let result = driver
        .run(
            &credentials(2),
            &voucher(),
            RunMode::FireOnce,
            &stats,
            &shutdown_tx,
            &mut shutdown_rx,
        )
        .await;
    if !matches!(result, Err(ValidationError::Interrupted { .. })) {
        return Err(AppError::validation(format!("expected Interrupted, got {:?}", result)));
    }
    if started.elapsed() > Duration::from_secs(5) {
        return Err(AppError::validation("wave outlived the shutdown"));
    }
    Ok(())
}
