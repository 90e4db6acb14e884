use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TetherConfig {
    pub session: SessionConfig,
    pub transfer: TransferConfig,
    pub simulator: SimulatorConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SessionConfig {
    /// Default timeout for device event waits, in milliseconds
    #[serde(default = "default_event_timeout_ms")]
    pub event_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TransferConfig {
    /// Window size for chunked transfers, in bytes
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Local directory downloads are written to
    #[serde(default = "default_download_dir")]
    pub download_dir: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SimulatorConfig {
    /// Model name reported by the simulated device
    #[serde(default = "default_simulator_model")]
    pub model: String,

    /// Unique id reported by the simulated device
    #[serde(default = "default_simulator_id")]
    pub id: String,

    /// Driver library name reported by the simulated device
    #[serde(default = "default_simulator_library")]
    pub library: String,
}

impl SessionConfig {
    pub fn event_timeout(&self) -> Duration {
        Duration::from_millis(self.event_timeout_ms)
    }
}

impl TetherConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("tethercam.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("session.event_timeout_ms", default_event_timeout_ms() as i64)?
            .set_default("transfer.chunk_size", default_chunk_size() as i64)?
            .set_default("transfer.download_dir", default_download_dir())?
            .set_default("simulator.model", default_simulator_model())?
            .set_default("simulator.id", default_simulator_id())?
            .set_default("simulator.library", default_simulator_library())?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // Add environment variables with TETHERCAM_ prefix
            .add_source(
                Environment::with_prefix("TETHERCAM")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: TetherConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.event_timeout_ms == 0 {
            return Err(ConfigError::Message(
                "Session event_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.transfer.chunk_size == 0 {
            return Err(ConfigError::Message(
                "Transfer chunk_size must be greater than 0".to_string(),
            ));
        }

        if self.transfer.download_dir.trim().is_empty() {
            return Err(ConfigError::Message(
                "Transfer download_dir must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for TetherConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig {
                event_timeout_ms: default_event_timeout_ms(),
            },
            transfer: TransferConfig {
                chunk_size: default_chunk_size(),
                download_dir: default_download_dir(),
            },
            simulator: SimulatorConfig {
                model: default_simulator_model(),
                id: default_simulator_id(),
                library: default_simulator_library(),
            },
        }
    }
}

// Default value functions
fn default_event_timeout_ms() -> u64 {
    5000
}

fn default_chunk_size() -> usize {
    crate::transfer::DEFAULT_WINDOW_SIZE
}
fn default_download_dir() -> String {
    "./downloads".to_string()
}

fn default_simulator_model() -> String {
    "Simulated Camera".to_string()
}
fn default_simulator_id() -> String {
    "sim-0001".to_string()
}
fn default_simulator_library() -> String {
    "simulated".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = TetherConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.session.event_timeout(), Duration::from_secs(5));
        assert_eq!(config.transfer.chunk_size, 1024 * 1024);
        assert_eq!(config.transfer.chunk_size, crate::transfer::DEFAULT_WINDOW_SIZE);
    }

    #[test]
    fn test_config_validation() {
        let mut config = TetherConfig::default();
        config.transfer.chunk_size = 0;
        assert!(config.validate().is_err());

        config.transfer.chunk_size = 4096;
        assert!(config.validate().is_ok());

        config.session.event_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = TetherConfig::load_from_file(temp_dir.path().join("absent.toml")).unwrap();
        let defaults = TetherConfig::default();
        assert_eq!(config.session, defaults.session);
        assert_eq!(config.simulator, defaults.simulator);
        assert_eq!(config.transfer.chunk_size, defaults.transfer.chunk_size);
    }

    #[test]
    fn test_load_from_file_overrides() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tethercam.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[session]\nevent_timeout_ms = 250\n\n[transfer]\nchunk_size = 8192\n\n[simulator]\nmodel = \"Bench Camera\""
        )
        .unwrap();

        let config = TetherConfig::load_from_file(&path).unwrap();
        assert_eq!(config.session.event_timeout_ms, 250);
        assert_eq!(config.transfer.chunk_size, 8192);
        assert_eq!(config.simulator.library, "simulated");
        assert_eq!(config.simulator.model, "Bench Camera");
        assert_eq!(config.simulator.id, "sim-0001");
    }

    #[test]
    fn test_environment_overrides_section_key() {
        let temp_dir = TempDir::new().unwrap();
        std::env::set_var("TETHERCAM_TRANSFER__DOWNLOAD_DIR", "/srv/tethered");

        let loaded = TetherConfig::load_from_file(temp_dir.path().join("absent.toml"));
        std::env::remove_var("TETHERCAM_TRANSFER__DOWNLOAD_DIR");

        let config = loaded.unwrap();
        assert_eq!(config.transfer.download_dir, "/srv/tethered");
        assert_eq!(config.transfer.chunk_size, 1024 * 1024);
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = TetherConfig::default();
        let rendered = toml::to_string_pretty(&config).unwrap();
        assert!(rendered.contains("[transfer]"));
        assert!(rendered.contains("chunk_size = 1048576"));
    }
}
