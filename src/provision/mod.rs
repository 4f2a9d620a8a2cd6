//! Batch-paced session provisioning.
//!
//! Each identity runs the three-step login exchange in its own task:
//! request a verification code, read it back from the side channel, and
//! trade it for a token. Identities are launched in batches with a pause
//! between batches, and a semaphore caps the number of exchanges in flight
//! at the batch size even when a batch outlives the pause.
use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, mpsc};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::api::{AuthApi, CodeSource};
use crate::args::PositiveUsize;
use crate::domain::{Credential, Identity, Token, ensure_unique};
use crate::error::{ApiError, ValidationError};


/// Batch size and inter-batch pause.
#[derive(Debug, Clone, Copy)]
pub struct ProvisionSettings {
    pub batch_size: PositiveUsize,
    pub batch_delay: Duration,
}

/// One identity that did not end up with a token.
#[derive(Debug)]
pub struct ProvisionFailure {
    pub identity: Identity,
    pub error: ApiError,
}

/// Every identity handed to [`AuthProvisioner::provision`] lands in exactly
/// one of the two lists.
#[derive(Debug, Default)]
pub struct ProvisionReport {
    pub credentials: Vec<Credential>,
    pub failures: Vec<ProvisionFailure>,
}

impl ProvisionReport {
    #[must_use]
    pub fn len(&self) -> usize {
        self.credentials.len().saturating_add(self.failures.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty() && self.failures.is_empty()
    }
}

type ExchangeResult = (usize, Identity, Result<Token, ApiError>);

/// Produces credentials for a set of identities.
pub struct AuthProvisioner<A: ?Sized, C: ?Sized> {
    auth: Arc<A>,
    codes: Arc<C>,
    settings: ProvisionSettings,
}

impl<A, C> AuthProvisioner<A, C>
where
    A: AuthApi + ?Sized + 'static,
    C: CodeSource + ?Sized + 'static,
{
    #[must_use]
    pub const fn new(auth: Arc<A>, codes: Arc<C>, settings: ProvisionSettings) -> Self {
        Self {
            auth,
            codes,
            settings,
        }
    }

    /// Runs the login exchange for every identity and collects the results.
    ///
    /// Per-identity failures never abort the run; they are returned in
    /// [`ProvisionReport::failures`]. Credentials keep the input order.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateIdentity` when an identity appears more than once.
    pub async fn provision(
        &self,
        identities: &[Identity],
    ) -> Result<ProvisionReport, ValidationError> {
        ensure_unique(identities)?;
        let total = identities.len();
        if total == 0 {
            return Ok(ProvisionReport::default());
        }

        let batch_size = self.settings.batch_size.get();
        let (result_tx, mut result_rx) = mpsc::channel::<ExchangeResult>(total);
        let permits = Arc::new(Semaphore::new(batch_size));
        let mut handles = Vec::with_capacity(total);
        let mut aborted = Vec::new();

        for (batch_index, batch) in plan_batches(total, batch_size).into_iter().enumerate() {
            if batch_index > 0 && !self.settings.batch_delay.is_zero() {
                sleep(self.settings.batch_delay).await;
            }
            info!(
                "Provisioning batch {} ({} identities, {}..{} of {})",
                batch_index.saturating_add(1),
                batch.len(),
                batch.start,
                batch.end,
                total
            );

            for index in batch {
                let Some(identity) = identities.get(index).cloned() else {
                    continue;
                };
                // The semaphore is never closed, so this only waits.
                let permit = Arc::clone(&permits).acquire_owned().await.ok();
                let auth = Arc::clone(&self.auth);
                let codes = Arc::clone(&self.codes);
                let result_tx = result_tx.clone();
                let task_identity = identity.clone();

                let handle = tokio::spawn(async move {
                    let result = exchange(auth.as_ref(), codes.as_ref(), &task_identity).await;
                    drop(permit);
                    // Capacity equals the identity count, so this never waits.
                    if result_tx.send((index, task_identity, result)).await.is_err() {
                        debug!("Provisioning collector closed before result was queued");
                    }
                });
                handles.push((identity, handle));
            }
        }
        drop(result_tx);

        for (identity, handle) in handles {
            if let Err(err) = handle.await {
                aborted.push(ProvisionFailure {
                    error: ApiError::TaskAborted {
                        identity: identity.to_string(),
                        message: err.to_string(),
                    },
                    identity,
                });
            }
        }

        let mut tokens = Vec::with_capacity(total);
        let mut failures = Vec::new();
        while let Some((index, identity, result)) = result_rx.recv().await {
            match result {
                Ok(token) => tokens.push((index, Credential::new(identity, token))),
                Err(error) => failures.push(ProvisionFailure { identity, error }),
            }
        }
        failures.extend(aborted);
        tokens.sort_by_key(|(index, _)| *index);

        for failure in &failures {
            warn!("Provisioning failed for {}: {}", failure.identity, failure.error);
        }
        info!(
            "Provisioned {} of {} identities ({} failed)",
            tokens.len(),
            total,
            failures.len()
        );

        Ok(ProvisionReport {
            credentials: tokens.into_iter().map(|(_, credential)| credential).collect(),
            failures,
        })
    }
}

async fn exchange<A, C>(auth: &A, codes: &C, identity: &Identity) -> Result<Token, ApiError>
where
    A: AuthApi + ?Sized,
    C: CodeSource + ?Sized,
{
    auth.send_code(identity).await?;
    let code = codes.fetch_code(identity).await?;
    auth.login(identity, &code).await
}

/// Splits `0..total` into consecutive ranges of at most `batch_size`.
pub(crate) fn plan_batches(total: usize, batch_size: usize) -> Vec<Range<usize>> {
    let step = batch_size.max(1);
    (0..total)
        .step_by(step)
        .map(|start| start..start.saturating_add(step).min(total))
        .collect()
}
