//! Dispatch window configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Dispatch window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Max tasks released per window
    #[serde(rename = "limit-per-window")]
    pub limit_per_window: usize,

    /// Window duration in milliseconds
    #[serde(rename = "window-ms")]
    pub window_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            limit_per_window: 1,
            window_ms: 1000,
        }
    }
}

impl DispatchConfig {
    /// Get the window as a Duration
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}
