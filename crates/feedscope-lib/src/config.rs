use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::window::DEFAULT_CAPACITY;

/// Environment variable naming an optional TOML config file.
pub const CONFIG_ENV: &str = "FEEDSCOPE_CONFIG";

#[cfg(target_os = "macos")]
pub const DEFAULT_DEVICE: &str = "/dev/cu.usbmodem2301";
#[cfg(target_os = "windows")]
pub const DEFAULT_DEVICE: &str = "COM3";
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub const DEFAULT_DEVICE: &str = "/dev/ttyACM0";

/// Settings for one pipeline instance, built once at startup.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub device_address: String,
    pub baud_rate: u32,
    pub window_capacity: usize,
    /// Minimum time between redraws.
    pub refresh_ms: u64,
    /// Serial read timeout; also bounds how long a stop request can go unnoticed.
    pub read_timeout_ms: u64,
    /// Time the renderer may spend on its own event queue after a draw.
    pub yield_budget_ms: u64,
    /// Consecutive gap breaches the firmware treats as a feed stop.
    pub stop_breaches: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            device_address: DEFAULT_DEVICE.to_string(),
            baud_rate: 115_200,
            window_capacity: DEFAULT_CAPACITY,
            refresh_ms: 10,
            read_timeout_ms: 1000,
            yield_budget_ms: 1,
            stop_breaches: 2,
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Defaults, or the file named by `FEEDSCOPE_CONFIG` when set.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => Self::load(Path::new(&path)),
            _ => Ok(Self::default()),
        }
    }

    /// Apply the command-line device override.
    pub fn with_device(mut self, device: Option<String>) -> Self {
        if let Some(device) = device {
            self.device_address = device;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device_address.trim().is_empty() {
            return Err(ConfigError::EmptyAddress);
        }
        for (field, value) in [
            ("baud_rate", u64::from(self.baud_rate)),
            ("window_capacity", self.window_capacity as u64),
            ("refresh_ms", self.refresh_ms),
            ("read_timeout_ms", self.read_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::Zero { field });
            }
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn yield_budget(&self) -> Duration {
        Duration::from_millis(self.yield_budget_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_match_firmware_settings() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.baud_rate, 115_200);
        assert_eq!(cfg.window_capacity, 600);
        assert_eq!(cfg.refresh_interval(), Duration::from_millis(10));
        assert_eq!(cfg.yield_budget(), Duration::from_millis(1));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "device_address = \"/dev/ttyUSB1\"\nwindow_capacity = 120").unwrap();
        let cfg = PipelineConfig::load(file.path()).unwrap();
        assert_eq!(cfg.device_address, "/dev/ttyUSB1");
        assert_eq!(cfg.window_capacity, 120);
        assert_eq!(cfg.baud_rate, 115_200);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err =
            PipelineConfig::from_toml_str("port = \"COM5\"", Path::new("x.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn cli_device_overrides_file() {
        let cfg = PipelineConfig::default().with_device(Some("COM5".into()));
        assert_eq!(cfg.device_address, "COM5");
        let cfg = cfg.with_device(None);
        assert_eq!(cfg.device_address, "COM5");
    }

    #[test]
    fn zero_values_fail_validation() {
        let cfg = PipelineConfig {
            window_capacity: 0,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Zero {
                field: "window_capacity"
            })
        ));
        let cfg = PipelineConfig {
            device_address: " ".into(),
            ..PipelineConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::EmptyAddress)));
    }
}
