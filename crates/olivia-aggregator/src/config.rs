//! Aggregation limits and timeouts

use olivia_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Upper bound for one (category, source) retrieval, retries included
    pub retrieval_timeout_ms: u64,

    /// Retrievals in flight at once within one request
    pub max_concurrency: usize,

    /// Records kept per category after deduplication
    pub max_records_per_category: usize,

    /// Upper bound for one liveness probe
    pub health_timeout_ms: u64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            retrieval_timeout_ms: 20_000,
            max_concurrency: 8,
            max_records_per_category: 10,
            health_timeout_ms: 10_000,
        }
    }
}

impl AggregationConfig {
    pub fn retrieval_timeout(&self) -> Duration {
        Duration::from_millis(self.retrieval_timeout_ms)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_millis(self.health_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.retrieval_timeout_ms == 0 || self.health_timeout_ms == 0 {
            return Err(Error::config("aggregation timeouts must be positive"));
        }
        if self.max_concurrency == 0 {
            return Err(Error::config("aggregation.max_concurrency must be at least 1"));
        }
        if self.max_records_per_category == 0 {
            return Err(Error::config(
                "aggregation.max_records_per_category must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AggregationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retrieval_timeout(), Duration::from_secs(20));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: AggregationConfig = serde_yaml::from_str("max_concurrency: 2").unwrap();
        assert_eq!(config.max_concurrency, 2);
        assert_eq!(config.max_records_per_category, 10);
    }

    #[test]
    fn test_zero_values_rejected() {
        let config = AggregationConfig {
            max_concurrency: 0,
            ..AggregationConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
