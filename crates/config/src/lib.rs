pub mod schema;

pub use schema::{CpuWatchConfig, SamplingConfig, ServerConfig, StoreConfig, StoreMode};

use cpuwatch_core::{CpuWatchError, Result};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// Load configuration from a TOML file.  Returns `CpuWatchConfig::default()`
/// if the file doesn't exist so the service always has sensible defaults.
pub fn load(path: impl AsRef<Path>) -> Result<CpuWatchConfig> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::warn!(
            "Config file not found at '{}'; using defaults.",
            path.display()
        );
        return Ok(CpuWatchConfig::default());
    }

    let raw = std::fs::read_to_string(path)
        .map_err(|e| CpuWatchError::Config(format!("cannot read '{}': {e}", path.display())))?;

    let config: CpuWatchConfig =
        toml::from_str(&raw).map_err(|e| CpuWatchError::Config(format!("TOML parse error: {e}")))?;
    config.validate()?;
    Ok(config)
}

/// Return the default config path, honouring `$XDG_CONFIG_HOME`.
pub fn default_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("cpuwatch").join("cpuwatch.toml")
}

impl CpuWatchConfig {
    /// Reject values the sampler cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.sampling.period()?;
        if self.sampling.avg_interval == 0 {
            return Err(CpuWatchError::Config("avg_interval must be at least 1".into()));
        }
        Ok(())
    }

    /// Window length as the registry expects it.
    pub fn avg_interval(&self) -> Result<NonZeroUsize> {
        NonZeroUsize::new(self.sampling.avg_interval)
            .ok_or_else(|| CpuWatchError::Config("avg_interval must be at least 1".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = CpuWatchConfig::default();
        assert_eq!(config.sampling.sampling_freq, 1.0);
        assert_eq!(config.sampling.avg_interval, 60);
        assert_eq!(config.sampling.round_to, 2);
        assert_eq!(config.server.host, "localhost");
        assert_eq!(config.server.port, 8845);
        assert_eq!(config.store.mode, StoreMode::Memory);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.sampling.avg_interval, 60);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let file = write_config(
            r#"
            [sampling]
            avg_interval = 10

            [store]
            mode = "file"
            path = "/tmp/usage.json"
            "#,
        );
        let config = load(file.path()).unwrap();
        assert_eq!(config.sampling.avg_interval, 10);
        assert_eq!(config.sampling.sampling_freq, 1.0);
        assert_eq!(config.store.mode, StoreMode::File);
        assert_eq!(config.store.path, PathBuf::from("/tmp/usage.json"));
        assert_eq!(config.server.port, 8845);
    }

    #[test]
    fn zero_window_is_rejected() {
        let file = write_config("[sampling]\navg_interval = 0\n");
        assert!(matches!(load(file.path()), Err(CpuWatchError::Config(_))));
    }

    #[test]
    fn non_positive_frequency_is_rejected() {
        let file = write_config("[sampling]\nsampling_freq = 0.0\n");
        assert!(matches!(load(file.path()), Err(CpuWatchError::Config(_))));
    }

    #[test]
    fn huge_frequency_is_rejected() {
        let file = write_config("[sampling]\nsampling_freq = 1e20\n");
        assert!(matches!(load(file.path()), Err(CpuWatchError::Config(_))));

        let mut config = CpuWatchConfig::default();
        config.sampling.sampling_freq = 1e20;
        assert!(matches!(config.validate(), Err(CpuWatchError::Config(_))));
        assert!(config.sampling.period().is_err());
    }

    #[test]
    fn validated_frequency_yields_period() {
        let mut config = CpuWatchConfig::default();
        config.sampling.sampling_freq = 0.25;
        config.validate().unwrap();
        assert_eq!(config.sampling.period().unwrap(), std::time::Duration::from_millis(250));
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let file = write_config("[sampling\n");
        assert!(matches!(load(file.path()), Err(CpuWatchError::Config(_))));
    }
}
