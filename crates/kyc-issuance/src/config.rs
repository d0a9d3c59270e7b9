//! Lifecycle manager configuration.

use std::time::Duration;

/// Default credential validity window.
pub const DEFAULT_VALIDITY_DAYS: u32 = 365;

/// Longest accepted validity window, one hundred years.
pub const MAX_VALIDITY_DAYS: u32 = 36_500;

/// Default bound on a single chain call.
pub const DEFAULT_SUBMISSION_TIMEOUT_SECS: u64 = 30;

/// Configuration for the [`CredentialLifecycleManager`](crate::CredentialLifecycleManager).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleConfig {
    /// Days between issue time and expiry time, in `1..=MAX_VALIDITY_DAYS`.
    pub validity_days: u32,
    /// Upper bound on each chain submitter call.
    pub submission_timeout: Duration,
}

impl LifecycleConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `KYC_VALIDITY_DAYS` (default: 365, 1 to 36500)
    /// - `KYC_SUBMISSION_TIMEOUT_SECS` (default: 30, minimum 1)
    pub fn from_env() -> Result<Self, ConfigError> {
        let validity_days = env_number("KYC_VALIDITY_DAYS", u64::from(DEFAULT_VALIDITY_DAYS))?;
        let validity_days = u32::try_from(validity_days).map_err(|_| ConfigError::OutOfRange {
            var: "KYC_VALIDITY_DAYS".into(),
            value: validity_days,
        })?;
        let timeout_secs =
            env_number("KYC_SUBMISSION_TIMEOUT_SECS", DEFAULT_SUBMISSION_TIMEOUT_SECS)?;
        Self::new(validity_days, Duration::from_secs(timeout_secs))
    }

    /// Build a configuration, rejecting a zero timeout and a validity window
    /// outside `1..=MAX_VALIDITY_DAYS`.
    pub fn new(validity_days: u32, submission_timeout: Duration) -> Result<Self, ConfigError> {
        if !(1..=MAX_VALIDITY_DAYS).contains(&validity_days) {
            return Err(ConfigError::OutOfRange {
                var: "validity_days".into(),
                value: u64::from(validity_days),
            });
        }
        if submission_timeout.is_zero() {
            return Err(ConfigError::OutOfRange {
                var: "submission_timeout".into(),
                value: 0,
            });
        }
        Ok(Self {
            validity_days,
            submission_timeout,
        })
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            validity_days: DEFAULT_VALIDITY_DAYS,
            submission_timeout: Duration::from_secs(DEFAULT_SUBMISSION_TIMEOUT_SECS),
        }
    }
}

fn env_number(var: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
            var: var.to_string(),
            value: raw,
        }),
        Err(_) => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a non-negative integer, got {value:?}")]
    InvalidNumber { var: String, value: String },
    #[error("{var} out of range: {value}")]
    OutOfRange { var: String, value: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = LifecycleConfig::default();
        assert_eq!(cfg.validity_days, 365);
        assert_eq!(cfg.submission_timeout, Duration::from_secs(30));
    }

    #[test]
    fn zero_values_rejected() {
        assert!(LifecycleConfig::new(0, Duration::from_secs(1)).is_err());
        assert!(LifecycleConfig::new(30, Duration::ZERO).is_err());
        assert!(LifecycleConfig::new(30, Duration::from_millis(200)).is_ok());
    }

    #[test]
    fn validity_window_is_capped() {
        assert!(LifecycleConfig::new(MAX_VALIDITY_DAYS, Duration::from_secs(1)).is_ok());
        assert_eq!(
            LifecycleConfig::new(MAX_VALIDITY_DAYS + 1, Duration::from_secs(1)),
            Err(ConfigError::OutOfRange {
                var: "validity_days".into(),
                value: u64::from(MAX_VALIDITY_DAYS + 1),
            })
        );
        assert!(LifecycleConfig::new(u32::MAX, Duration::from_secs(1)).is_err());
    }

    #[test]
    fn env_number_rejects_garbage() {
        std::env::set_var("KYC_ISSUANCE_TEST_BAD_DAYS", "a year");
        let result = env_number("KYC_ISSUANCE_TEST_BAD_DAYS", 365);
        std::env::remove_var("KYC_ISSUANCE_TEST_BAD_DAYS");
        assert!(matches!(result, Err(ConfigError::InvalidNumber { .. })));
    }
}
