use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{Instant, sleep};

use crate::domain::{Identity, Token, VoucherId};
use crate::error::ApiError;

use super::{AuthApi, CodeSource, Envelope, Payload, PurchaseApi};

/// Auth double that tracks how many exchanges overlap.
pub(crate) struct ScriptedAuth {
    latency: Duration,
    reject: HashSet<String>,
    crash: Option<String>,
    started_at: Mutex<Vec<Instant>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    logins: AtomicUsize,
}

impl ScriptedAuth {
    pub(crate) fn new(latency: Duration) -> Self {
        Self {
            latency,
            reject: HashSet::new(),
            crash: None,
            started_at: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            logins: AtomicUsize::new(0),
        }
    }

    pub(crate) fn rejecting(mut self, identities: &[&str]) -> Self {
        self.reject = identities.iter().map(|id| (*id).to_owned()).collect();
        self
    }

    /// Makes the exchange task for `identity` unwind instead of answering.
    pub(crate) fn crashing_on(mut self, identity: &str) -> Self {
        self.crash = Some(identity.to_owned());
        self
    }

    /// Start instants of every exchange, in ascending order.
    pub(crate) fn started(&self) -> Vec<Instant> {
        let mut times = self
            .started_at
            .lock()
            .map(|times| times.clone())
            .unwrap_or_default();
        times.sort_unstable();
        times
    }

    pub(crate) fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub(crate) fn logins(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthApi for ScriptedAuth {
    async fn send_code(&self, identity: &Identity) -> Result<(), ApiError> {
        if let Ok(mut times) = self.started_at.lock() {
            times.push(Instant::now());
        }
        if self.crash.as_deref() == Some(identity.as_str()) {
            std::panic::resume_unwind(Box::new(format!("scripted crash for {}", identity)));
        }
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        self.peak.fetch_max(now, Ordering::SeqCst);
        sleep(self.latency).await;
        if self.reject.contains(identity.as_str()) {
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            return Err(ApiError::UnexpectedStatus {
                endpoint: "send-code",
                status: 429,
            });
        }
        Ok(())
    }

    async fn login(&self, identity: &Identity, code: &str) -> Result<Token, ApiError> {
        sleep(self.latency).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.logins.fetch_add(1, Ordering::SeqCst);
        Ok(Token::new(format!("token-{}-{}", identity, code)))
    }
}

/// Code source that answers every identity with the same code.
pub(crate) struct FixedCodes(pub(crate) &'static str);

#[async_trait]
impl CodeSource for FixedCodes {
    async fn fetch_code(&self, identity: &Identity) -> Result<String, ApiError> {
        if self.0.is_empty() {
            return Err(ApiError::CodeMissing {
                identity: identity.to_string(),
            });
        }
        Ok(self.0.to_owned())
    }
}

/// What the purchase double answers.
#[derive(Debug, Clone, Copy)]
pub(crate) enum PurchaseScript {
    /// Grants orders until stock runs out, then rejects.
    Stock(usize),
    /// Every request times out.
    Timeout,
}

/// Purchase double with a simulated round trip and limited stock.
pub(crate) struct ScriptedPurchase {
    latency: Duration,
    script: PurchaseScript,
    granted: AtomicUsize,
    requests: AtomicUsize,
    tokens: Mutex<Vec<String>>,
    dispatched_at: Mutex<Vec<Instant>>,
}

impl ScriptedPurchase {
    pub(crate) fn new(latency: Duration, script: PurchaseScript) -> Self {
        Self {
            latency,
            script,
            granted: AtomicUsize::new(0),
            requests: AtomicUsize::new(0),
            tokens: Mutex::new(Vec::new()),
            dispatched_at: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub(crate) fn tokens(&self) -> Vec<String> {
        self.tokens.lock().map(|tokens| tokens.clone()).unwrap_or_default()
    }

    pub(crate) fn last_dispatch(&self) -> Option<Instant> {
        self.dispatched_at
            .lock()
            .ok()
            .and_then(|times| times.iter().max().copied())
    }
}

#[async_trait]
impl PurchaseApi for ScriptedPurchase {
    async fn purchase(&self, token: &Token, _voucher: &VoucherId) -> Result<Envelope, ApiError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut times) = self.dispatched_at.lock() {
            times.push(Instant::now());
        }
        if let Ok(mut tokens) = self.tokens.lock() {
            tokens.push(token.as_str().to_owned());
        }
        sleep(self.latency).await;
        match self.script {
            PurchaseScript::Timeout => Err(ApiError::Timeout {
                endpoint: "purchase",
            }),
            PurchaseScript::Stock(stock) => {
                let order = self.granted.fetch_add(1, Ordering::SeqCst);
                if order < stock {
                    Ok(Envelope {
                        success: true,
                        data: Payload::Text(order.saturating_add(1000).to_string()),
                    })
                } else {
                    Ok(Envelope {
                        success: false,
                        data: Payload::Text("stock not enough".to_owned()),
                    })
                }
            }
        }
    }
}
