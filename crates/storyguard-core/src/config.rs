//! Configuration for the Storyguard security client.
//!
//! All tuning knobs of the security core live here, grouped by the
//! component they drive. Defaults are safe for production; the builder
//! exists for tests and for deployments that need different rotation or
//! retention policies.
//!
//! # Example
//!
//! ```
//! use storyguard_core::config::{SecurityConfig, SecurityConfigBuilder};
//! use std::time::Duration;
//!
//! // Use defaults
//! let config = SecurityConfig::default();
//!
//! // Or customize
//! let config = SecurityConfigBuilder::new()
//!     .with_max_key_age_days(30)
//!     .with_allocation_retry_limit(5)
//!     .with_oracle_timeout(Duration::from_secs(5))
//!     .build();
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

use storyguard_identity::AllocatorConfig;
use storyguard_sentinel::{MonitorConfig, SeverityWeights, DEFAULT_EVENT_RETENTION_DAYS};
use storyguard_vault::{KeyPolicy, DEFAULT_MAX_KEY_AGE_DAYS, DEFAULT_MAX_KEY_USAGE_COUNT};

/// Default number of identifier allocation attempts.
const DEFAULT_ALLOCATION_RETRY_LIMIT: u32 = 10;

/// Default uniqueness oracle timeout in seconds.
const DEFAULT_ORACLE_TIMEOUT_SECS: u64 = 10;

/// Main security configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Key rotation policy.
    pub keys: KeyRotationSettings,

    /// Identifier allocation settings.
    pub allocation: AllocationSettings,

    /// Threat monitoring settings.
    pub monitor: MonitorSettings,
}

impl SecurityConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration builder.
    pub fn builder() -> SecurityConfigBuilder {
        SecurityConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// Returns an error if any value is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.keys.max_key_age_days <= 0 {
            return Err(ConfigError::InvalidValue {
                field: "keys.max_key_age_days".into(),
                reason: "maximum key age must be positive".into(),
            });
        }

        if self.keys.max_key_usage_count == 0 {
            return Err(ConfigError::InvalidValue {
                field: "keys.max_key_usage_count".into(),
                reason: "maximum key usage count must be greater than zero".into(),
            });
        }

        if self.allocation.retry_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "allocation.retry_limit".into(),
                reason: "retry limit must be greater than zero".into(),
            });
        }

        if self.allocation.oracle_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "allocation.oracle_timeout".into(),
                reason: "oracle timeout must be greater than zero".into(),
            });
        }

        Ok(())
    }

    /// The vault rotation policy derived from this configuration.
    pub fn key_policy(&self) -> KeyPolicy {
        KeyPolicy {
            max_key_age_days: self.keys.max_key_age_days,
            max_key_usage_count: self.keys.max_key_usage_count,
        }
    }

    /// The allocator configuration derived from this configuration.
    pub fn allocator_config(&self) -> AllocatorConfig {
        AllocatorConfig {
            retry_limit: self.allocation.retry_limit,
            oracle_timeout: self.allocation.oracle_timeout,
        }
    }

    /// The monitor configuration derived from this configuration.
    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            event_retention_days: self.monitor.event_retention_days,
            weights: self.monitor.severity_weights,
        }
    }
}

/// Key rotation policy settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeyRotationSettings {
    /// Maximum key age in days before rotation is due.
    pub max_key_age_days: i64,

    /// Maximum uses of one key version before rotation is due.
    pub max_key_usage_count: u64,
}

impl Default for KeyRotationSettings {
    fn default() -> Self {
        Self {
            max_key_age_days: DEFAULT_MAX_KEY_AGE_DAYS,
            max_key_usage_count: DEFAULT_MAX_KEY_USAGE_COUNT,
        }
    }
}

/// Identifier allocation settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AllocationSettings {
    /// Maximum candidate attempts per allocation.
    pub retry_limit: u32,

    /// Timeout for one uniqueness oracle round-trip. A timed-out call
    /// is treated as a retriable failure, never as "not found".
    #[serde(with = "duration_serde")]
    pub oracle_timeout: Duration,
}

impl Default for AllocationSettings {
    fn default() -> Self {
        Self {
            retry_limit: DEFAULT_ALLOCATION_RETRY_LIMIT,
            oracle_timeout: Duration::from_secs(DEFAULT_ORACLE_TIMEOUT_SECS),
        }
    }
}

/// Threat monitoring settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MonitorSettings {
    /// Retention for resolved events in days. `None` keeps them forever.
    /// Unresolved events are never pruned.
    pub event_retention_days: Option<u32>,

    /// Per-severity posture score deductions.
    pub severity_weights: SeverityWeights,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            event_retention_days: Some(DEFAULT_EVENT_RETENTION_DAYS),
            severity_weights: SeverityWeights::default(),
        }
    }
}

/// Builder for constructing [`SecurityConfig`] with custom values.
#[derive(Clone, Debug, Default)]
pub struct SecurityConfigBuilder {
    config: SecurityConfig,
}

impl SecurityConfigBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: SecurityConfig::default(),
        }
    }

    /// Build the final configuration.
    pub fn build(self) -> SecurityConfig {
        self.config
    }

    /// Build and validate the configuration.
    pub fn build_validated(self) -> Result<SecurityConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }

    /// Set the maximum key age in days.
    pub fn with_max_key_age_days(mut self, days: i64) -> Self {
        self.config.keys.max_key_age_days = days;
        self
    }

    /// Set the maximum key usage count.
    pub fn with_max_key_usage_count(mut self, count: u64) -> Self {
        self.config.keys.max_key_usage_count = count;
        self
    }

    /// Set the allocation retry limit.
    pub fn with_allocation_retry_limit(mut self, limit: u32) -> Self {
        self.config.allocation.retry_limit = limit;
        self
    }

    /// Set the uniqueness oracle timeout.
    pub fn with_oracle_timeout(mut self, timeout: Duration) -> Self {
        self.config.allocation.oracle_timeout = timeout;
        self
    }

    /// Set the retention for resolved threat events.
    pub fn with_event_retention_days(mut self, days: u32) -> Self {
        self.config.monitor.event_retention_days = Some(days);
        self
    }

    /// Keep resolved threat events forever.
    pub fn without_event_retention(mut self) -> Self {
        self.config.monitor.event_retention_days = None;
        self
    }

    /// Set the per-severity posture score deductions.
    pub fn with_severity_weights(mut self, weights: SeverityWeights) -> Self {
        self.config.monitor.severity_weights = weights;
        self
    }
}

/// Configuration error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Invalid configuration value.
    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue {
        /// The field name.
        field: String,
        /// Why it is invalid.
        reason: String,
    },
}

/// Serde support for Duration serialization.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    #[derive(Serialize, Deserialize)]
    struct DurationRepr {
        secs: u64,
        nanos: u32,
    }

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let repr = DurationRepr {
            secs: duration.as_secs(),
            nanos: duration.subsec_nanos(),
        };
        repr.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let repr = DurationRepr::deserialize(deserializer)?;
        Ok(Duration::new(repr.secs, repr.nanos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SecurityConfig::default();

        assert_eq!(config.keys.max_key_age_days, DEFAULT_MAX_KEY_AGE_DAYS);
        assert_eq!(config.keys.max_key_usage_count, DEFAULT_MAX_KEY_USAGE_COUNT);
        assert_eq!(config.allocation.retry_limit, 10);
        assert_eq!(config.allocation.oracle_timeout, Duration::from_secs(10));
        assert_eq!(
            config.monitor.event_retention_days,
            Some(DEFAULT_EVENT_RETENTION_DAYS)
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = SecurityConfigBuilder::new()
            .with_max_key_age_days(30)
            .with_max_key_usage_count(500)
            .with_allocation_retry_limit(5)
            .with_oracle_timeout(Duration::from_secs(3))
            .with_event_retention_days(7)
            .build();

        assert_eq!(config.keys.max_key_age_days, 30);
        assert_eq!(config.keys.max_key_usage_count, 500);
        assert_eq!(config.allocation.retry_limit, 5);
        assert_eq!(config.allocation.oracle_timeout, Duration::from_secs(3));
        assert_eq!(config.monitor.event_retention_days, Some(7));
    }

    #[test]
    fn test_without_event_retention() {
        let config = SecurityConfigBuilder::new().without_event_retention().build();
        assert_eq!(config.monitor.event_retention_days, None);
    }

    #[test]
    fn test_validation_rejects_zero_retry_limit() {
        let result = SecurityConfigBuilder::new()
            .with_allocation_retry_limit(0)
            .build_validated();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { field, .. }) if field == "allocation.retry_limit"
        ));
    }

    #[test]
    fn test_validation_rejects_zero_timeout() {
        let result = SecurityConfigBuilder::new()
            .with_oracle_timeout(Duration::from_secs(0))
            .build_validated();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { field, .. }) if field == "allocation.oracle_timeout"
        ));
    }

    #[test]
    fn test_validation_rejects_bad_key_policy() {
        let result = SecurityConfigBuilder::new()
            .with_max_key_age_days(0)
            .build_validated();
        assert!(result.is_err());

        let result = SecurityConfigBuilder::new()
            .with_max_key_usage_count(0)
            .build_validated();
        assert!(result.is_err());
    }

    #[test]
    fn test_component_config_derivation() {
        let config = SecurityConfigBuilder::new()
            .with_max_key_age_days(45)
            .with_allocation_retry_limit(3)
            .build();

        assert_eq!(config.key_policy().max_key_age_days, 45);
        assert_eq!(config.allocator_config().retry_limit, 3);
        assert_eq!(
            config.monitor_config().event_retention_days,
            Some(DEFAULT_EVENT_RETENTION_DAYS)
        );
    }

    #[test]
    fn test_serialization_roundtrip() {
        let original = SecurityConfigBuilder::new()
            .with_max_key_age_days(14)
            .with_oracle_timeout(Duration::from_millis(2500))
            .without_event_retention()
            .build();

        let json = serde_json::to_string(&original).expect("serialize");
        let restored: SecurityConfig = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(restored.keys.max_key_age_days, 14);
        assert_eq!(
            restored.allocation.oracle_timeout,
            Duration::from_millis(2500)
        );
        assert_eq!(restored.monitor.event_retention_days, None);
    }
}
