//! Proxy checker module for verifying relays and running batches of checks

use crate::proxy::aggregate::{AggregateState, DEFAULT_COUNTRY_CAP};
use crate::proxy::client::{ClientConfig, RequestClient, TlsClient, DEFAULT_TIMEOUT_MS};
use crate::proxy::models::{Candidate, IdentityInfo, ProbeResult, VerifiedProxy, PROXY_TEST_FAILED};
use crate::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, warn};

/// Default number of concurrently active verifications
pub const DEFAULT_CONCURRENCY: usize = 50;

/// Default reference endpoint host
pub const DEFAULT_RESOLVER_HOST: &str = "myip.shylook.workers.dev";

/// Default reference endpoint path
pub const DEFAULT_RESOLVER_PATH: &str = "/";

/// Configuration for proxy checker
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Deadline for each request leg
    pub timeout: Duration,
    /// Number of concurrent verifications
    pub concurrency: usize,
    /// Host of the reference endpoint
    pub resolver_host: String,
    /// Path of the reference endpoint
    pub resolver_path: String,
    /// Entries kept per country in the mapping
    pub country_cap: usize,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            concurrency: DEFAULT_CONCURRENCY,
            resolver_host: DEFAULT_RESOLVER_HOST.to_string(),
            resolver_path: DEFAULT_RESOLVER_PATH.to_string(),
            country_cap: DEFAULT_COUNTRY_CAP,
        }
    }
}

impl CheckerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// A zero ceiling would never dispatch anything, so it is raised to one
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_resolver(mut self, host: String, path: String) -> Self {
        self.resolver_host = host;
        self.resolver_path = path;
        self
    }

    pub fn with_country_cap(mut self, cap: usize) -> Self {
        self.country_cap = cap;
        self
    }

    fn client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: self.timeout,
            ..ClientConfig::default()
        }
    }
}

/// Relay checker comparing egress identity with and without the candidate
pub struct ProxyChecker<C = TlsClient> {
    config: CheckerConfig,
    client: Arc<C>,
}

impl ProxyChecker<TlsClient> {
    /// Create a checker backed by the TLS client
    pub fn with_config(config: CheckerConfig) -> Result<Self> {
        let client = TlsClient::with_config(config.client_config())?;
        Ok(Self::with_client(config, client))
    }
}

impl<C: RequestClient> ProxyChecker<C> {
    /// Create a checker over any request client
    pub fn with_client(config: CheckerConfig, client: C) -> Self {
        Self {
            config,
            client: Arc::new(client),
        }
    }

    /// Verify a single candidate
    ///
    /// Both legs always run to completion before the outcome is decided.
    pub async fn check_proxy(&self, candidate: &Candidate) -> ProbeResult {
        let relay = candidate.relay();
        let host = self.config.resolver_host.as_str();
        let path = self.config.resolver_path.as_str();

        let (via_relay, direct) = tokio::join!(
            self.client.send(host, path, Some(&relay)),
            self.client.send(host, path, None),
        );

        let result = match (via_relay, direct) {
            (Ok(via_body), Ok(direct_body)) => evaluate(candidate, &via_body, &direct_body),
            (Err(e), _) => {
                ProbeResult::failed(format!("{}: relay request: {}", PROXY_TEST_FAILED, e))
            }
            (_, Err(e)) => {
                ProbeResult::failed(format!("{}: direct request: {}", PROXY_TEST_FAILED, e))
            }
        };

        match &result {
            ProbeResult::Success(verified) => {
                debug!(proxy = %candidate, country = %verified.country, "relay verified")
            }
            ProbeResult::Failure { message, .. } => {
                debug!(proxy = %candidate, %message, "relay rejected")
            }
        }

        result
    }

    /// Verify every candidate with at most `concurrency` units active
    ///
    /// Each unit runs on its own task and reports through a channel; results
    /// are folded in arrival order. A unit that panics reports nothing.
    pub async fn check_proxies(&self, candidates: Vec<Candidate>) -> AggregateState {
        let (tx, mut rx) = mpsc::unbounded_channel::<ProbeResult>();
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let checker = self.clone();

        let dispatcher = tokio::spawn(async move {
            let mut spawned = 0usize;
            for candidate in candidates {
                let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                    break;
                };
                let tx = tx.clone();
                let checker = checker.clone();
                tokio::spawn(async move {
                    let _permit = permit;
                    let result = checker.check_proxy(&candidate).await;
                    let _ = tx.send(result);
                });
                spawned += 1;
            }
            spawned
        });

        let mut state = AggregateState::new(self.config.country_cap);
        let mut received = 0usize;
        while let Some(result) = rx.recv().await {
            received += 1;
            state.fold(result);
        }

        match dispatcher.await {
            Ok(spawned) if spawned > received => {
                warn!(
                    dropped = spawned - received,
                    "verification units exited without a result"
                )
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "dispatcher stopped early"),
        }

        state
    }
}

impl<C> Clone for ProxyChecker<C> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            client: Arc::clone(&self.client),
        }
    }
}

/// Decide a candidate from the two response bodies
///
/// The relay passes only if it reports a non-empty IP that differs from the
/// direct one. The probed identity, not the declared metadata, is recorded.
pub fn evaluate(candidate: &Candidate, via_body: &str, direct_body: &str) -> ProbeResult {
    let (Ok(via), Ok(direct)) = (
        IdentityInfo::from_body(via_body),
        IdentityInfo::from_body(direct_body),
    ) else {
        return ProbeResult::failed(PROXY_TEST_FAILED);
    };

    if !via.ip.is_empty() && via.ip != direct.ip {
        ProbeResult::Success(VerifiedProxy::new(candidate, via))
    } else {
        ProbeResult::failed(PROXY_TEST_FAILED)
    }
}
