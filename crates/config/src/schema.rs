use cpuwatch_core::{CpuWatchError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure parsed from `cpuwatch.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CpuWatchConfig {
    /// Sampler cadence and averaging window.
    pub sampling: SamplingConfig,
    /// HTTP listener and dashboard assets.
    pub server: ServerConfig,
    /// Where snapshots are published for the HTTP layer.
    pub store: StoreConfig,
}

/// Sampler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Seconds between the end of one tick and the start of the next.
    pub sampling_freq: f64,
    /// Window length in samples. The averaging horizon in wall-clock time is
    /// `avg_interval × sampling_freq`.
    pub avg_interval: usize,
    /// Decimal places averages are rounded to.
    pub round_to: u32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            sampling_freq: 1.0,
            avg_interval:  60,
            round_to:      2,
        }
    }
}

impl SamplingConfig {
    /// Sleep between ticks.
    ///
    /// # Errors
    /// [`CpuWatchError::Config`] unless `sampling_freq` is a positive number of
    /// seconds small enough to fit a [`Duration`].
    pub fn period(&self) -> Result<Duration> {
        let freq = self.sampling_freq;
        if !freq.is_finite() || freq <= 0.0 {
            return Err(CpuWatchError::Config(format!(
                "sampling_freq must be a positive number of seconds, got {freq}"
            )));
        }
        Duration::try_from_secs_f64(freq).map_err(|e| {
            CpuWatchError::Config(format!("sampling_freq {freq} is out of range: {e}"))
        })
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding `stats.html` and its scripts/styles.
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host:       "localhost".to_string(),
            port:       8845,
            static_dir: PathBuf::from("static"),
        }
    }
}

/// Snapshot publication mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreMode {
    /// Queries read a snapshot shared in memory with the sampler.
    #[default]
    Memory,
    /// The sampler rewrites a JSON file each tick; queries read the file.
    File,
}

/// Snapshot store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub mode: StoreMode,
    /// JSON snapshot location, used when `mode = "file"`.
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            mode: StoreMode::Memory,
            path: PathBuf::from("cpu_usage.json"),
        }
    }
}
