//! Database availability probes.

use crate::cancellation::CancellationToken;
use crate::config::RetryConfig;
use crate::connection::ConnectionSource;
use crate::error::{PersistenceError, PersistenceResult};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Blocks until the database accepts connections.
pub trait AvailabilityAwaiter: Send + Sync {
    /// Waits for the database.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Cancelled`] when cancellation is observed
    /// between attempts, or a store-unavailable error once the retry policy
    /// is exhausted.
    fn wait_for_database(&self, cancellation: &CancellationToken) -> PersistenceResult<()>;
}

/// Treats the database as always available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAvailabilityAwaiter;

impl AvailabilityAwaiter for NullAvailabilityAwaiter {
    fn wait_for_database(&self, _cancellation: &CancellationToken) -> PersistenceResult<()> {
        Ok(())
    }
}

/// Runs `probe` until it succeeds, following `retry`.
fn wait_with_retry(
    target: &str,
    retry: &RetryConfig,
    cancellation: &CancellationToken,
    mut probe: impl FnMut() -> PersistenceResult<()>,
) -> PersistenceResult<()> {
    let attempts = retry.max_attempts.max(1);
    let mut last_error = None;

    for attempt in 0..attempts {
        let delay = retry.delay_for_attempt(attempt);
        if !delay.is_zero() {
            thread::sleep(delay);
        }
        cancellation.check()?;

        match probe() {
            Ok(()) => {
                info!(target_db = target, attempt, "Database is available");
                return Ok(());
            }
            Err(error) => {
                warn!(
                    target_db = target,
                    attempt,
                    max_attempts = attempts,
                    error = %error,
                    "Database not available yet"
                );
                last_error = Some(error);
            }
        }
    }

    let reason = last_error.map_or_else(String::new, |e| e.to_string());
    Err(PersistenceError::store_unavailable(format!(
        "{target} not available after {attempts} attempts: {reason}"
    )))
}

/// Probes a TCP endpoint until it accepts a connection.
#[derive(Debug, Clone)]
pub struct TcpAvailabilityAwaiter {
    host: String,
    port: u16,
    connect_timeout: Duration,
    retry: RetryConfig,
}

impl TcpAvailabilityAwaiter {
    /// Creates an awaiter for `host:port`.
    ///
    /// # Errors
    ///
    /// Rejects an empty host or port 0.
    pub fn new(host: impl Into<String>, port: u16) -> PersistenceResult<Self> {
        let host = host.into();
        if host.trim().is_empty() {
            return Err(PersistenceError::invalid_config("host must not be empty"));
        }
        if port == 0 {
            return Err(PersistenceError::invalid_config("port must be greater than 0"));
        }
        Ok(Self {
            host,
            port,
            connect_timeout: Duration::from_secs(2),
            retry: RetryConfig::default(),
        })
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the timeout of a single connection attempt.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    fn connect_once(&self) -> PersistenceResult<()> {
        let addresses = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| PersistenceError::store_unavailable(format!("cannot resolve host: {e}")))?;

        let mut last_error = None;
        for address in addresses {
            match TcpStream::connect_timeout(&address, self.connect_timeout) {
                Ok(_stream) => {
                    debug!(%address, "TCP probe succeeded");
                    return Ok(());
                }
                Err(e) => last_error = Some(e),
            }
        }
        Err(PersistenceError::store_unavailable(match last_error {
            Some(e) => e.to_string(),
            None => "host resolved to no addresses".to_string(),
        }))
    }
}

impl AvailabilityAwaiter for TcpAvailabilityAwaiter {
    fn wait_for_database(&self, cancellation: &CancellationToken) -> PersistenceResult<()> {
        let target = format!("{}:{}", self.host, self.port);
        wait_with_retry(&target, &self.retry, cancellation, || self.connect_once())
    }
}

/// Probes the database by opening and closing a connection from a source.
pub struct ConnectionAvailabilityAwaiter<S: ConnectionSource + ?Sized> {
    source: Arc<S>,
    retry: RetryConfig,
}

impl<S: ConnectionSource + ?Sized> ConnectionAvailabilityAwaiter<S> {
    /// Creates an awaiter probing `source` with the default retry policy.
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            retry: RetryConfig::default(),
        }
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn probe(&self) -> PersistenceResult<()> {
        let mut connection = self.source.create()?;
        connection.open()?;
        connection.close()
    }
}

impl<S: ConnectionSource + ?Sized> AvailabilityAwaiter for ConnectionAvailabilityAwaiter<S> {
    fn wait_for_database(&self, cancellation: &CancellationToken) -> PersistenceResult<()> {
        wait_with_retry(self.source.descriptor(), &self.retry, cancellation, || {
            self.probe()
        })
    }
}
