use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

/// Service configuration loaded from `motionctl.yaml`.
///
/// All fields have defaults so a missing or partial file is fine.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServiceConfig {
    #[serde(default)]
    pub poller: PollerSettings,

    #[serde(default)]
    pub scan: ScanSettings,

    #[serde(default)]
    pub logging: LogSettings,
}

/// Defaults for pollers created without explicit timing parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerSettings {
    /// Seconds between register reads.
    #[serde(default = "default_sampling_time")]
    pub sampling_time_s: f64,

    /// Seconds between sample-batch broadcasts.
    #[serde(default = "default_refresh_time")]
    pub refresh_time_s: f64,

    /// Ring-buffer capacity in samples.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

impl PollerSettings {
    pub fn sampling_time(&self) -> Duration {
        Duration::from_secs_f64(self.sampling_time_s)
    }

    pub fn refresh_time(&self) -> Duration {
        Duration::from_secs_f64(self.refresh_time_s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSettings {
    /// Nodes a scan must find before it counts as successful.
    #[serde(default = "default_minimum_nodes")]
    pub minimum_nodes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_log_dir")]
    pub dir: String,

    #[serde(default = "default_log_prefix")]
    pub prefix: String,

    #[serde(default)]
    pub debug_mode: bool,
}

fn default_sampling_time() -> f64 {
    0.125
}

fn default_refresh_time() -> f64 {
    0.125
}

fn default_buffer_size() -> usize {
    100
}

fn default_minimum_nodes() -> usize {
    2
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_log_prefix() -> String {
    "motionctl".to_string()
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            sampling_time_s: default_sampling_time(),
            refresh_time_s: default_refresh_time(),
            buffer_size: default_buffer_size(),
        }
    }
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            minimum_nodes: default_minimum_nodes(),
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            prefix: default_log_prefix(),
            debug_mode: false,
        }
    }
}

/// Loads and saves the YAML configuration file.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a manager rooted at `config_dir`, creating the directory if
    /// needed.
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref();
        if !config_dir.exists() {
            fs::create_dir_all(config_dir)
                .with_context(|| format!("Failed to create config directory: {config_dir}"))?;
        }

        Ok(Self {
            config_path: config_dir.join("motionctl.yaml"),
        })
    }

    /// Load the configuration, falling back to defaults when the file does
    /// not exist.
    pub fn load(&self) -> Result<ServiceConfig> {
        if !self.config_path.exists() {
            tracing::warn!(
                "Config file not found at {}, using defaults",
                self.config_path
            );
            return Ok(ServiceConfig::default());
        }

        let file_contents = fs::read_to_string(&self.config_path)
            .with_context(|| format!("Failed to read config: {}", self.config_path))?;

        let config: ServiceConfig = serde_yaml_ng::from_str(&file_contents)
            .with_context(|| format!("Failed to parse config: {}", self.config_path))?;

        tracing::info!("Loaded config from {}", self.config_path);
        Ok(config)
    }

    /// Write the configuration back as YAML.
    pub fn save(&self, config: &ServiceConfig) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(config).context("Failed to serialize config to YAML")?;

        fs::write(&self.config_path, yaml_string)
            .with_context(|| format!("Failed to write config: {}", self.config_path))?;

        tracing::info!("Saved config to {}", self.config_path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.poller.buffer_size, 100);
        assert_eq!(config.poller.sampling_time(), Duration::from_millis(125));
        assert_eq!(config.scan.minimum_nodes, 2);
        assert_eq!(config.logging.dir, "logs");
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: ServiceConfig = serde_yaml_ng::from_str("scan:\n  minimum_nodes: 1\n").unwrap();
        assert_eq!(config.scan.minimum_nodes, 1);
        assert_eq!(config.poller.buffer_size, 100);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let dir_path = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        let manager = ConfigManager::new(&dir_path).unwrap();

        let mut config = ServiceConfig::default();
        config.scan.minimum_nodes = 1;
        config.poller.buffer_size = 50;
        manager.save(&config).unwrap();

        let loaded = manager.load().unwrap();
        assert_eq!(loaded.scan.minimum_nodes, 1);
        assert_eq!(loaded.poller.buffer_size, 50);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let dir_path = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        let manager = ConfigManager::new(&dir_path).unwrap();

        let config = manager.load().unwrap();
        assert_eq!(config.poller.buffer_size, 100);
    }
}
