//! Configuration for the persistence feature.

use std::time::Duration;

/// Configuration of a [`Persistence`](crate::Persistence) instance.
#[derive(Debug, Clone)]
pub struct PersistenceConfig {
    /// Whether each operation runs inside a database transaction. When
    /// false, operations still get a connection but no transaction.
    pub enable_transactions: bool,
    /// Retry policy used while waiting for the database to become available.
    pub availability_retry: RetryConfig,
}

impl PersistenceConfig {
    /// Creates the default configuration: transactions on, default retry.
    pub fn new() -> Self {
        Self {
            enable_transactions: true,
            availability_retry: RetryConfig::default(),
        }
    }

    /// Enables or disables the transaction decorator.
    #[must_use]
    pub fn with_transactions(mut self, enabled: bool) -> Self {
        self.enable_transactions = enabled;
        self
    }

    /// Sets the availability retry policy.
    #[must_use]
    pub fn with_availability_retry(mut self, retry: RetryConfig) -> Self {
        self.availability_retry = retry;
        self
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Exponential backoff policy.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
    /// Growth factor between consecutive delays.
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    /// Creates a policy with `max_attempts` attempts and default delays.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
        }
    }

    /// Creates a policy that makes a single attempt.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
        }
    }

    /// Sets the initial delay.
    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay.
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the backoff multiplier. Values below 1.0, and values that are
    /// not finite, are treated as 1.0.
    #[must_use]
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Returns the delay to wait before attempt `attempt` (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let multiplier = if self.backoff_multiplier.is_finite() {
            self.backoff_multiplier.max(1.0)
        } else {
            1.0
        };
        let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
        let delay = self.initial_delay.as_secs_f64() * multiplier.powi(exponent);
        // 0 * inf is NaN when the initial delay is zero.
        let delay = if delay.is_nan() {
            0.0
        } else {
            delay.min(self.max_delay.as_secs_f64())
        };
        Duration::try_from_secs_f64(delay).unwrap_or(self.max_delay)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(10)
    }
}
