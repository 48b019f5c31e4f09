//! Configuration loading and typed config structures for the crop growth
//! simulation.
//!
//! The canonical configuration lives in `cropsim-config.yaml` at the project
//! root. Every field has a default, so an empty file (or no file at all) is a
//! valid configuration.

use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

use cropsim_world::{
    FieldLimits, MAX_FIELD_DIMENSION, MIN_FIELD_DIMENSION, MIN_PLANT_SCALE, PLANT_COUNT_SCALE,
    SCALE_FACTOR,
};

/// Environment variable overriding `geocoding.api_key`.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration. Mirrors the structure of `cropsim-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CropSimConfig {
    /// Timeline generation settings.
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Field sizing and plant rendering settings.
    #[serde(default)]
    pub field: FieldConfig,

    /// Playback timer settings.
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// Geocoding and current-weather HTTP settings.
    #[serde(default)]
    pub geocoding: GeocodingConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CropSimConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `OPENWEATHER_API_KEY` overrides `geocoding.api_key` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not a map.
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.geocoding.apply_env_overrides();
        Ok(config)
    }
}

/// Timeline generation settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulationConfig {
    /// Seed for all randomness. `None` draws from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Number of days in a generated timeline.
    #[serde(default = "default_total_days")]
    pub total_days: u32,

    /// First day of the timeline.
    #[serde(default = "default_start_date")]
    pub start_date: NaiveDate,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            total_days: default_total_days(),
            start_date: default_start_date(),
        }
    }
}

/// Field sizing and plant rendering settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldConfig {
    /// Scene units per metre.
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f64,

    /// Smallest allowed field width or depth after scaling.
    #[serde(default = "default_min_dimension")]
    pub min_dimension: f64,

    /// Largest allowed field width or depth after scaling.
    #[serde(default = "default_max_dimension")]
    pub max_dimension: f64,

    /// Fraction of real-world plants that are rendered.
    #[serde(default = "default_plant_count_scale")]
    pub plant_count_scale: f64,

    /// Smallest rendered plant scale.
    #[serde(default = "default_min_plant_scale")]
    pub min_plant_scale: f64,
}

impl FieldConfig {
    /// The geometry clamps as used by the field scaler.
    pub const fn limits(&self) -> FieldLimits {
        FieldLimits {
            scale_factor: self.scale_factor,
            min_dimension: self.min_dimension,
            max_dimension: self.max_dimension,
        }
    }
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            scale_factor: default_scale_factor(),
            min_dimension: default_min_dimension(),
            max_dimension: default_max_dimension(),
            plant_count_scale: default_plant_count_scale(),
            min_plant_scale: default_min_plant_scale(),
        }
    }
}

/// Playback timer settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlaybackConfig {
    /// Milliseconds per day at speed 1.0.
    #[serde(default = "default_base_interval_ms")]
    pub base_interval_ms: u64,

    /// Speed factor at construction.
    #[serde(default = "default_initial_speed")]
    pub initial_speed: f64,

    /// Whether playback starts immediately.
    #[serde(default = "default_true")]
    pub autoplay: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            base_interval_ms: default_base_interval_ms(),
            initial_speed: default_initial_speed(),
            autoplay: true,
        }
    }
}

/// Geocoding and current-weather HTTP settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeocodingConfig {
    /// API root, without a trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key. Empty disables lookups.
    #[serde(default)]
    pub api_key: String,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl GeocodingConfig {
    /// Override the API key with `OPENWEATHER_API_KEY` when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(API_KEY_ENV) {
            self.api_key = val;
        }
    }

    /// Whether lookups can be attempted at all.
    pub fn is_enabled(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_total_days() -> u32 {
    90
}

fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 20).unwrap_or_default()
}

const fn default_scale_factor() -> f64 {
    SCALE_FACTOR
}

const fn default_min_dimension() -> f64 {
    MIN_FIELD_DIMENSION
}

const fn default_max_dimension() -> f64 {
    MAX_FIELD_DIMENSION
}

const fn default_plant_count_scale() -> f64 {
    PLANT_COUNT_SCALE
}

const fn default_min_plant_scale() -> f64 {
    MIN_PLANT_SCALE
}

const fn default_base_interval_ms() -> u64 {
    1000
}

const fn default_initial_speed() -> f64 {
    1.0
}

fn default_base_url() -> String {
    "https://api.openweathermap.org".to_owned()
}

const fn default_timeout_ms() -> u64 {
    5000
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = CropSimConfig::default();
        assert_eq!(config.simulation.total_days, 90);
        assert_eq!(
            config.simulation.start_date,
            NaiveDate::from_ymd_opt(2025, 3, 20).unwrap()
        );
        assert_eq!(config.field.max_dimension, 150.0);
        assert_eq!(config.field.limits(), FieldLimits::default());
        assert_eq!(config.playback.base_interval_ms, 1000);
        assert!(config.playback.autoplay);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
simulation:
  seed: 7
  total_days: 30
  start_date: "2024-06-01"

field:
  scale_factor: 0.5
  min_dimension: 20
  max_dimension: 200
  plant_count_scale: 0.02
  min_plant_scale: 0.1

playback:
  base_interval_ms: 250
  initial_speed: 2.0
  autoplay: false

geocoding:
  base_url: "http://localhost:8080"
  timeout_ms: 1000

logging:
  level: "debug"
"#;

        let config = CropSimConfig::parse(yaml).unwrap();
        assert_eq!(config.simulation.seed, Some(7));
        assert_eq!(config.simulation.total_days, 30);
        assert_eq!(
            config.simulation.start_date,
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
        );
        assert_eq!(config.field.limits().max_dimension, 200.0);
        assert_eq!(config.field.plant_count_scale, 0.02);
        assert_eq!(config.playback.initial_speed, 2.0);
        assert!(!config.playback.autoplay);
        assert_eq!(config.geocoding.base_url, "http://localhost:8080");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let config = CropSimConfig::parse("playback:\n  initial_speed: 4.0\n").unwrap();
        assert_eq!(config.playback.initial_speed, 4.0);
        assert_eq!(config.playback.base_interval_ms, 1000);
        assert_eq!(config.simulation.total_days, 90);
        assert_eq!(config.field, FieldConfig::default());
    }

    #[test]
    fn empty_yaml_is_default() {
        let config = CropSimConfig::parse("").unwrap();
        assert_eq!(config.simulation, SimulationConfig::default());
    }

    #[test]
    fn invalid_yaml_is_rejected() {
        let result = CropSimConfig::parse("simulation: [unclosed");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = CropSimConfig::from_file(Path::new("/nonexistent/cropsim-config.yaml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
