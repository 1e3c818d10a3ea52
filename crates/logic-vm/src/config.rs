//! Executor configuration

use serde::{Deserialize, Serialize};

/// Tunables for one executor instance. The defaults match a stock processor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Suppress graphics output entirely (dedicated servers)
    pub headless: bool,
    /// Maximum queued draw commands between flushes
    pub graphics_capacity: usize,
    /// Maximum characters in the text buffer and in a flushed message
    pub text_capacity: usize,
    /// Queue capacity of displays created by hosts from this config
    pub display_capacity: usize,
    /// Ticks between radar rescans when the base is a building
    pub radar_refresh_ticks: f64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            headless: false,
            graphics_capacity: 256,
            text_capacity: 256,
            display_capacity: 1024,
            radar_refresh_ticks: 30.0,
        }
    }
}
