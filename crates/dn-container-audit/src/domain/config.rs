//! # Audit Configuration

use crate::domain::errors::ConfigError;
use std::time::Duration;

/// Default bound on one container's enumeration plus store fetch.
pub const DEFAULT_CONTAINER_TIMEOUT: Duration = Duration::from_secs(300);

/// Workers per available core.
pub const WORKERS_PER_CORE: usize = 2;

/// Run-wide reconciliation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditConfig {
    /// Containers reconciled concurrently.
    pub workers: usize,
    /// Upper bound for one container; exceeded containers are reported as failed.
    pub container_timeout: Duration,
    /// Also raise a warning for every block whose file is missing.
    pub escalate_dangling: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            container_timeout: DEFAULT_CONTAINER_TIMEOUT,
            escalate_dangling: false,
        }
    }
}

impl AuditConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.container_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout("container"));
        }
        Ok(())
    }
}

/// A small multiple of the available cores.
pub fn default_workers() -> usize {
    num_cpus::get().saturating_mul(WORKERS_PER_CORE).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AuditConfig::default();
        assert!(config.workers >= WORKERS_PER_CORE);
        assert!(!config.escalate_dangling);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_rejects_zero_workers_and_timeout() {
        let config = AuditConfig {
            workers: 0,
            ..AuditConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NoWorkers));

        let config = AuditConfig {
            container_timeout: Duration::ZERO,
            ..AuditConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroTimeout("container")));
    }
}
