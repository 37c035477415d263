//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;
use std::path::{Path, PathBuf};

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "BLEDUT";

/// Config file name
const CONFIG_FILE_NAME: &str = "bledut.toml";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "BLEDUT_CONFIG";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `BLEDUT_CONFIG` environment variable (explicit path)
    /// 2. `./bledut.toml` (current directory)
    /// 3. `~/.config/bledut/bledut.toml` (XDG on Linux/macOS)
    /// 4. `%APPDATA%\bledut\bledut.toml` (Windows)
    /// 5. Built-in defaults (no file required)
    ///
    /// Environment variables can override any config file values.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = if let Some(ref path) = config_path {
            load_from_file(path)?
        } else {
            Config::default()
        };

        apply_env_overrides(&mut config)?;

        Ok(Self { config_path, config })
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Create a loader with default configuration (no file).
    pub fn with_defaults() -> Self {
        let mut config = Config::default();
        // Still apply env overrides even with defaults
        let _ = apply_env_overrides(&mut config);

        Self {
            config_path: None,
            config,
        }
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Save the current configuration to a specific file.
    pub fn save_to(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        save_to_file(&self.config, path.as_ref())
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    // 1. Explicit environment variable
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. Current directory
    let cwd_config = PathBuf::from(CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    // 3. XDG config directory (Linux/macOS) or APPDATA (Windows)
    if let Some(config_dir) = get_config_dir() {
        let app_config = config_dir.join("bledut").join(CONFIG_FILE_NAME);
        if app_config.exists() {
            return Some(app_config);
        }
    }

    // 4. No config file found - will use defaults
    None
}

/// Get the platform-specific config directory.
fn get_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA").ok().map(PathBuf::from)
    }

    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".config"))
            })
    }
}

/// Load configuration from a file.
fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(ConfigError::ParseError)
}

/// Save configuration to a file.
fn save_to_file(config: &Config, path: &Path) -> ConfigResult<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|e| ConfigError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Apply environment variable overrides to the configuration.
///
/// Environment variables follow the pattern: `BLEDUT_<SECTION>_<KEY>`
/// For example:
/// - `BLEDUT_DEVICE_GATEWAY_PORT=/dev/ttyUSB1`
/// - `BLEDUT_DEVICE_BAUD=1000000`
/// - `BLEDUT_TIMING_RESPONSE_TIMEOUT_MS=250`
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    // Device overrides
    if let Ok(val) = std::env::var(format!("{}_DEVICE_GATEWAY_PORT", ENV_PREFIX)) {
        config.device.gateway_port = Some(val);
    }
    if let Ok(val) = std::env::var(format!("{}_DEVICE_BAUD", ENV_PREFIX)) {
        config.device.baud = val.parse().map_err(|_| {
            ConfigError::env_parse(format!("{}_DEVICE_BAUD", ENV_PREFIX), "Invalid baud rate")
        })?;
    }
    if let Ok(val) = std::env::var(format!("{}_DEVICE_SERVICE_UUIDS", ENV_PREFIX)) {
        config.device.service_uuids = val.split(',').map(|s| s.trim().to_string()).collect();
    }

    // Timing overrides
    if let Ok(val) = std::env::var(format!("{}_TIMING_RESPONSE_TIMEOUT_MS", ENV_PREFIX)) {
        config.timing.response_timeout_ms = val.parse().map_err(|_| {
            ConfigError::env_parse(
                format!("{}_TIMING_RESPONSE_TIMEOUT_MS", ENV_PREFIX),
                "Invalid timeout",
            )
        })?;
    }

    // Logging overrides
    if let Ok(val) = std::env::var(format!("{}_LOGGING_LEVEL", ENV_PREFIX)) {
        config.logging.level = val;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    fn test_default_loader() {
        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().device.baud, 115200);
    }

    #[test]
    #[serial]
    fn test_env_override() {
        env::set_var("BLEDUT_TIMING_RESPONSE_TIMEOUT_MS", "750");

        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().timing.response_timeout_ms, 750);

        env::remove_var("BLEDUT_TIMING_RESPONSE_TIMEOUT_MS");
    }

    #[test]
    #[serial]
    fn test_env_override_invalid_value() {
        env::set_var("BLEDUT_DEVICE_BAUD", "fast");

        let result = ConfigLoader::load();
        assert!(matches!(result, Err(ConfigError::EnvParseError { .. })));

        env::remove_var("BLEDUT_DEVICE_BAUD");
    }

    #[test]
    #[serial]
    fn test_service_uuid_list_env() {
        env::set_var(
            "BLEDUT_DEVICE_SERVICE_UUIDS",
            "2413b33f-707f-90bd-2045-2ab8807571b7, 6e400001-b5a3-f393-e0a9-e50e24dcca9e",
        );

        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().device.service_uuids.len(), 2);
        assert!(loader.config().device.parsed_service_uuids().is_ok());

        env::remove_var("BLEDUT_DEVICE_SERVICE_UUIDS");
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bledut.toml");

        let mut loader = ConfigLoader::with_defaults();
        loader.config.device.gateway_port = Some("/dev/ttyACM7".to_string());
        loader.save_to(&path).unwrap();

        let reloaded = ConfigLoader::load_from(&path).unwrap();
        assert_eq!(
            reloaded.config().device.gateway_port.as_deref(),
            Some("/dev/ttyACM7")
        );
    }

    #[test]
    fn test_missing_file() {
        let result = ConfigLoader::load_from("/nonexistent/bledut.toml");
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }
}
