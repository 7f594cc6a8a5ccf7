use crate::error::{GeoflowError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_TERRAIN_SERVICE_URL: &str =
    "https://ws.geonorge.no/terrengprofil/arcgis/rest/services/Profile/GPServer/Profile";
pub const DEFAULT_ELEVATION_SERVICE_URL: &str =
    "https://ws.geonorge.no/hoydeprofil/arcgis/rest/services/Profile/GPServer/Profile";
pub const DEFAULT_PRINT_SERVICE_URL: &str = "https://ws.geonorge.no/print/kv/report.pdf";
pub const DEFAULT_PRINT_CRS: &str = "EPSG:25833";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;
pub const DEFAULT_PRINT_MAX_ATTEMPTS: u32 = 10;
pub const DEFAULT_PRINT_SCALE: f64 = 25000.0;
pub const DEFAULT_PRINT_DPI: u32 = 128;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has at least the current precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() >= self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for the geoprocessing and print workflows
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub terrain_service_url: ConfigValue<String>,
    pub elevation_service_url: ConfigValue<String>,
    pub print_service_url: ConfigValue<String>,
    pub print_crs: ConfigValue<String>,
    pub poll_interval_ms: ConfigValue<u64>,
    pub print_max_attempts: ConfigValue<u32>,
    pub default_print_scale: ConfigValue<f64>,
    pub print_dpi: ConfigValue<u32>,
}

impl Default for LayeredConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        let d = ConfigSource::Default;
        Self {
            terrain_service_url: ConfigValue::new(DEFAULT_TERRAIN_SERVICE_URL.to_string(), d),
            elevation_service_url: ConfigValue::new(DEFAULT_ELEVATION_SERVICE_URL.to_string(), d),
            print_service_url: ConfigValue::new(DEFAULT_PRINT_SERVICE_URL.to_string(), d),
            print_crs: ConfigValue::new(DEFAULT_PRINT_CRS.to_string(), d),
            poll_interval_ms: ConfigValue::new(DEFAULT_POLL_INTERVAL_MS, d),
            print_max_attempts: ConfigValue::new(DEFAULT_PRINT_MAX_ATTEMPTS, d),
            default_print_scale: ConfigValue::new(DEFAULT_PRINT_SCALE, d),
            print_dpi: ConfigValue::new(DEFAULT_PRINT_DPI, d),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| GeoflowError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| GeoflowError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        let f = ConfigSource::File;
        if let Some(url) = file_config.terrain_service_url {
            self.terrain_service_url.update(url, f);
        }
        if let Some(url) = file_config.elevation_service_url {
            self.elevation_service_url.update(url, f);
        }
        if let Some(url) = file_config.print_service_url {
            self.print_service_url.update(url, f);
        }
        if let Some(crs) = file_config.print_crs {
            self.print_crs.update(crs, f);
        }
        if let Some(ms) = file_config.poll_interval_ms {
            self.poll_interval_ms.update(ms, f);
        }
        if let Some(attempts) = file_config.print_max_attempts {
            self.print_max_attempts.update(attempts, f);
        }
        if let Some(scale) = file_config.default_print_scale {
            self.default_print_scale.update(scale, f);
        }
        if let Some(dpi) = file_config.print_dpi {
            self.print_dpi.update(dpi, f);
        }

        self.validate()?;
        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        let e = ConfigSource::Environment;

        // GEOFLOW_TERRAIN_URL
        if let Ok(url) = env::var("GEOFLOW_TERRAIN_URL") {
            self.terrain_service_url.update(url, e);
        }

        // GEOFLOW_ELEVATION_URL
        if let Ok(url) = env::var("GEOFLOW_ELEVATION_URL") {
            self.elevation_service_url.update(url, e);
        }

        // GEOFLOW_PRINT_URL
        if let Ok(url) = env::var("GEOFLOW_PRINT_URL") {
            self.print_service_url.update(url, e);
        }

        // GEOFLOW_PRINT_CRS
        if let Ok(crs) = env::var("GEOFLOW_PRINT_CRS") {
            self.print_crs.update(crs, e);
        }

        // GEOFLOW_POLL_INTERVAL_MS
        if let Ok(ms_str) = env::var("GEOFLOW_POLL_INTERVAL_MS") {
            match ms_str.parse::<u64>() {
                Ok(ms) if ms > 0 => self.poll_interval_ms.update(ms, e),
                _ => tracing::warn!(
                    "Invalid GEOFLOW_POLL_INTERVAL_MS value '{}': expected positive integer",
                    ms_str
                ),
            }
        }

        // GEOFLOW_PRINT_MAX_ATTEMPTS
        if let Ok(attempts_str) = env::var("GEOFLOW_PRINT_MAX_ATTEMPTS") {
            match attempts_str.parse::<u32>() {
                Ok(attempts) if attempts > 0 => self.print_max_attempts.update(attempts, e),
                _ => tracing::warn!(
                    "Invalid GEOFLOW_PRINT_MAX_ATTEMPTS value '{}': expected positive integer",
                    attempts_str
                ),
            }
        }

        // GEOFLOW_DEFAULT_PRINT_SCALE
        if let Ok(scale_str) = env::var("GEOFLOW_DEFAULT_PRINT_SCALE") {
            match scale_str.parse::<f64>() {
                Ok(scale) if scale.is_finite() && scale > 0.0 => {
                    self.default_print_scale.update(scale, e)
                }
                _ => tracing::warn!(
                    "Invalid GEOFLOW_DEFAULT_PRINT_SCALE value '{}': expected positive number",
                    scale_str
                ),
            }
        }

        // GEOFLOW_PRINT_DPI
        if let Ok(dpi_str) = env::var("GEOFLOW_PRINT_DPI") {
            match dpi_str.parse::<u32>() {
                Ok(dpi) if dpi > 0 => self.print_dpi.update(dpi, e),
                _ => tracing::warn!(
                    "Invalid GEOFLOW_PRINT_DPI value '{}': expected positive integer",
                    dpi_str
                ),
            }
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        let c = ConfigSource::Cli;
        if let Some(url) = overrides.terrain_service_url {
            self.terrain_service_url.update(url, c);
        }
        if let Some(url) = overrides.elevation_service_url {
            self.elevation_service_url.update(url, c);
        }
        if let Some(url) = overrides.print_service_url {
            self.print_service_url.update(url, c);
        }
        if let Some(crs) = overrides.print_crs {
            self.print_crs.update(crs, c);
        }
        if let Some(ms) = overrides.poll_interval_ms {
            self.poll_interval_ms.update(ms, c);
        }
        if let Some(attempts) = overrides.print_max_attempts {
            self.print_max_attempts.update(attempts, c);
        }
    }

    /// Reject values no workflow can run with
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms.value == 0 {
            return Err(GeoflowError::ConfigInvalid {
                key: "poll_interval_ms".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.print_max_attempts.value == 0 {
            return Err(GeoflowError::ConfigInvalid {
                key: "print_max_attempts".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        let scale = self.default_print_scale.value;
        if !scale.is_finite() || scale <= 0.0 {
            return Err(GeoflowError::ConfigInvalid {
                key: "default_print_scale".to_string(),
                reason: format!("must be a positive number, got {}", scale),
            });
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.value)
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "terrain_service_url".to_string(),
            (self.terrain_service_url.value.clone(), self.terrain_service_url.source),
        );
        map.insert(
            "elevation_service_url".to_string(),
            (self.elevation_service_url.value.clone(), self.elevation_service_url.source),
        );
        map.insert(
            "print_service_url".to_string(),
            (self.print_service_url.value.clone(), self.print_service_url.source),
        );
        map.insert("print_crs".to_string(), (self.print_crs.value.clone(), self.print_crs.source));
        map.insert(
            "poll_interval_ms".to_string(),
            (self.poll_interval_ms.value.to_string(), self.poll_interval_ms.source),
        );
        map.insert(
            "print_max_attempts".to_string(),
            (self.print_max_attempts.value.to_string(), self.print_max_attempts.source),
        );
        map.insert(
            "default_print_scale".to_string(),
            (self.default_print_scale.value.to_string(), self.default_print_scale.source),
        );
        map.insert(
            "print_dpi".to_string(),
            (self.print_dpi.value.to_string(), self.print_dpi.source),
        );

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    terrain_service_url: Option<String>,
    elevation_service_url: Option<String>,
    print_service_url: Option<String>,
    print_crs: Option<String>,
    poll_interval_ms: Option<u64>,
    print_max_attempts: Option<u32>,
    default_print_scale: Option<f64>,
    print_dpi: Option<u32>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub terrain_service_url: Option<String>,
    pub elevation_service_url: Option<String>,
    pub print_service_url: Option<String>,
    pub print_crs: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub print_max_attempts: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = LayeredConfig::with_defaults();
        assert_eq!(config.print_crs.value, "EPSG:25833");
        assert_eq!(config.print_crs.source, ConfigSource::Default);
        assert_eq!(config.poll_interval(), Duration::from_millis(2000));
        assert_eq!(config.print_max_attempts.value, 10);
        assert_eq!(config.default_print_scale.value, 25000.0);
    }

    #[test]
    fn test_config_precedence() {
        let mut value = ConfigValue::new(100, ConfigSource::Default);

        // File should override default
        value.update(200, ConfigSource::File);
        assert_eq!(value.value, 200);
        assert_eq!(value.source, ConfigSource::File);

        // Environment should override file
        value.update(300, ConfigSource::Environment);
        assert_eq!(value.value, 300);

        // CLI should override environment
        value.update(400, ConfigSource::Cli);
        assert_eq!(value.value, 400);
        assert_eq!(value.source, ConfigSource::Cli);

        // Lower precedence should not override
        value.update(500, ConfigSource::File);
        assert_eq!(value.value, 400);
        assert_eq!(value.source, ConfigSource::Cli);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
print_crs = "EPSG:25832"
poll_interval_ms = 500
print_max_attempts = 4
default_print_scale = 50000.0
"#
        )
        .unwrap();

        let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

        assert_eq!(config.print_crs.value, "EPSG:25832");
        assert_eq!(config.print_crs.source, ConfigSource::File);
        assert_eq!(config.poll_interval_ms.value, 500);
        assert_eq!(config.print_max_attempts.value, 4);
        assert_eq!(config.default_print_scale.value, 50000.0);
        // Untouched keys keep their defaults
        assert_eq!(config.print_dpi.source, ConfigSource::Default);
    }

    #[test]
    fn test_zero_interval_in_file_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "poll_interval_ms = 0").unwrap();

        let result = LayeredConfig::with_defaults().load_from_file(file.path());
        assert!(matches!(result, Err(GeoflowError::ConfigInvalid { ref key, .. }) if key == "poll_interval_ms"));
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = LayeredConfig::with_defaults();

        config.update_from_cli(CliConfigOverrides {
            print_service_url: Some("http://localhost:8080/print/report.pdf".to_string()),
            print_max_attempts: Some(3),
            ..Default::default()
        });

        assert_eq!(config.print_service_url.value, "http://localhost:8080/print/report.pdf");
        assert_eq!(config.print_service_url.source, ConfigSource::Cli);
        assert_eq!(config.print_max_attempts.value, 3);
        assert_eq!(config.terrain_service_url.source, ConfigSource::Default);
    }

    #[test]
    fn test_inspection_map() {
        let map = LayeredConfig::with_defaults().to_inspection_map();

        assert_eq!(map.len(), 8);
        let (crs_value, crs_source) = &map["print_crs"];
        assert_eq!(crs_value, "EPSG:25833");
        assert_eq!(*crs_source, ConfigSource::Default);
    }
}
