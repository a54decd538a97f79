//! Admission queue configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Leaky bucket configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionConfig {
    /// Max jobs held in the backlog
    pub capacity: usize,

    /// Jobs released per tick
    #[serde(rename = "drain-rate")]
    pub drain_rate: usize,

    /// Tick period in milliseconds
    #[serde(rename = "tick-ms")]
    pub tick_ms: u64,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            drain_rate: 1,
            tick_ms: 1000,
        }
    }
}

impl AdmissionConfig {
    /// Get the tick period as a Duration
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AdmissionConfig::default();
        assert_eq!(config.capacity, 10);
        assert_eq!(config.drain_rate, 1);
        assert_eq!(config.tick_period(), Duration::from_secs(1));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: AdmissionConfig = serde_yaml::from_str("capacity: 3").unwrap();
        assert_eq!(config.capacity, 3);
        assert_eq!(config.drain_rate, 1);
        assert_eq!(config.tick_ms, 1000);
    }
}
