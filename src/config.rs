//! Configuration management for the `cityweather` tool
//!
//! Handles loading configuration from a TOML file and environment variables,
//! and provides validation for all configuration settings.

use crate::CityWeatherError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the `cityweather` tool
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CityWeatherConfig {
    /// Weather API configuration
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Random sampling settings
    #[serde(default)]
    pub sampling: SamplingConfig,
    /// Coordinate grid bounds and resolution
    #[serde(default)]
    pub grid: GridConfig,
    /// City list used for nearest-city lookups
    #[serde(default)]
    pub gazetteer: GazetteerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Weather API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// OpenWeatherMap API key
    pub api_key: Option<String>,
    /// Base URL for the weather API
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// Unit system passed to the API (imperial, metric or standard)
    #[serde(default = "default_weather_units")]
    pub units: String,
    /// Request timeout in seconds
    #[serde(default = "default_weather_timeout")]
    pub timeout_seconds: u32,
}

/// Sampling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Number of coordinate draws (or target unique cities with `until_unique`)
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    /// Fixed RNG seed; a random one is drawn when absent
    pub seed: Option<u64>,
    /// Keep sampling until `iterations` unique cities are collected
    #[serde(default)]
    pub until_unique: bool,
    /// Draw budget per requested city in `until_unique` mode
    #[serde(default = "default_max_draws_per_city")]
    pub max_draws_per_city: usize,
}

/// Coordinate grid settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    #[serde(default = "default_lat_min")]
    pub lat_min: f64,
    #[serde(default = "default_lat_max")]
    pub lat_max: f64,
    #[serde(default = "default_lng_min")]
    pub lng_min: f64,
    #[serde(default = "default_lng_max")]
    pub lng_max: f64,
    #[serde(default = "default_grid_step")]
    pub step: f64,
}

/// Gazetteer settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GazetteerConfig {
    /// Optional `Country,City,Latitude,Longitude` CSV replacing the bundled city list
    pub path: Option<PathBuf>,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_weather_base_url() -> String {
    "http://api.openweathermap.org/data/2.5".to_string()
}

fn default_weather_units() -> String {
    "imperial".to_string()
}

fn default_weather_timeout() -> u32 {
    30
}

fn default_iterations() -> usize {
    20
}

fn default_max_draws_per_city() -> usize {
    100
}

fn default_lat_min() -> f64 {
    -90.0
}

fn default_lat_max() -> f64 {
    90.0
}

fn default_lng_min() -> f64 {
    -180.0
}

fn default_lng_max() -> f64 {
    180.0
}

/// Finest grid resolution accepted from configuration
pub const MIN_GRID_STEP: f64 = 0.001;

fn default_grid_step() -> f64 {
    0.1
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_weather_base_url(),
            units: default_weather_units(),
            timeout_seconds: default_weather_timeout(),
        }
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            seed: None,
            until_unique: false,
            max_draws_per_city: default_max_draws_per_city(),
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            lat_min: default_lat_min(),
            lat_max: default_lat_max(),
            lng_min: default_lng_min(),
            lng_max: default_lng_max(),
            step: default_grid_step(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl CityWeatherConfig {
    /// Load configuration from `config_path`, or from the default location when
    /// none is given, then apply environment overrides
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path()
                .filter(|path| path.exists())
                .unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // CITYWEATHER_WEATHER__API_KEY -> weather.api_key
        builder = builder.add_source(
            Environment::with_prefix("CITYWEATHER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: CityWeatherConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("cityweather").join("config.toml"))
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.units.is_empty() {
            self.weather.units = default_weather_units();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_weather_timeout();
        }
        if self.sampling.max_draws_per_city == 0 {
            self.sampling.max_draws_per_city = default_max_draws_per_city();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_key()?;
        self.validate_numeric_ranges()?;
        self.validate_grid()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate the API key when one is provided
    pub fn validate_api_key(&self) -> Result<()> {
        if let Some(api_key) = &self.weather.api_key {
            if api_key.is_empty() {
                return Err(CityWeatherError::config(
                    "Weather API key cannot be empty if provided. Either remove it or provide a valid key."
                ).into());
            }

            if api_key.len() < 8 {
                return Err(CityWeatherError::config(
                    "Weather API key appears to be invalid (too short)"
                ).into());
            }

            if api_key.len() > 100 {
                return Err(CityWeatherError::config(
                    "Weather API key appears to be invalid (too long)"
                ).into());
            }
        }

        Ok(())
    }

    /// Returns the API key, failing when none is configured
    pub fn require_api_key(&self) -> Result<&str> {
        self.weather.api_key.as_deref().ok_or_else(|| {
            CityWeatherError::config(
                "weather.api_key is not set (config file or CITYWEATHER_WEATHER__API_KEY)",
            )
            .into()
        })
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.weather.timeout_seconds > 300 {
            return Err(CityWeatherError::config(
                "Weather API timeout cannot exceed 300 seconds"
            ).into());
        }

        if self.sampling.max_draws_per_city > 10_000 {
            return Err(CityWeatherError::config(
                "Draw budget per city cannot exceed 10000"
            ).into());
        }

        Ok(())
    }

    fn validate_grid(&self) -> Result<()> {
        let grid = &self.grid;

        if !(grid.step > 0.0) {
            return Err(CityWeatherError::config("Grid step must be positive").into());
        }

        if grid.step < MIN_GRID_STEP {
            return Err(CityWeatherError::config(format!(
                "Grid step {} is finer than the minimum of {MIN_GRID_STEP}",
                grid.step
            ))
            .into());
        }

        if !(grid.lat_min < grid.lat_max) || !(grid.lng_min < grid.lng_max) {
            return Err(CityWeatherError::config(
                "Grid minimum bounds must be below maximum bounds"
            ).into());
        }

        if grid.lat_min < -90.0 || grid.lat_max > 90.0 {
            return Err(CityWeatherError::config(
                "Grid latitude bounds must lie within [-90, 90]"
            ).into());
        }

        if grid.lng_min < -180.0 || grid.lng_max > 180.0 {
            return Err(CityWeatherError::config(
                "Grid longitude bounds must lie within [-180, 180]"
            ).into());
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(CityWeatherError::config(
                format!("Invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    valid_log_levels.join(", ")
                )
            ).into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(CityWeatherError::config(
                format!("Invalid log format '{}'. Must be one of: {}",
                    self.logging.format,
                    valid_log_formats.join(", ")
                )
            ).into());
        }

        let valid_units = ["imperial", "metric", "standard"];
        if !valid_units.contains(&self.weather.units.as_str()) {
            return Err(CityWeatherError::config(
                format!("Invalid unit system '{}'. Must be one of: {}",
                    self.weather.units,
                    valid_units.join(", ")
                )
            ).into());
        }

        if !self.weather.base_url.starts_with("http://") && !self.weather.base_url.starts_with("https://") {
            return Err(CityWeatherError::config(
                "Weather API base URL must be a valid HTTP or HTTPS URL"
            ).into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = CityWeatherConfig::default();
        assert_eq!(config.weather.base_url, "http://api.openweathermap.org/data/2.5");
        assert_eq!(config.weather.units, "imperial");
        assert_eq!(config.weather.timeout_seconds, 30);
        assert_eq!(config.sampling.iterations, 20);
        assert!(!config.sampling.until_unique);
        assert_eq!(config.grid.step, 0.1);
        assert_eq!(config.logging.level, "info");
        assert!(config.weather.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_api_key_is_reported() {
        let config = CityWeatherConfig::default();
        let err = config.require_api_key().unwrap_err();
        assert!(err.to_string().contains("weather.api_key"));
    }

    #[test]
    fn test_short_api_key_rejected() {
        let mut config = CityWeatherConfig::default();
        config.weather.api_key = Some("abc".to_string());
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("too short"));
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = CityWeatherConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_invalid_units() {
        let mut config = CityWeatherConfig::default();
        config.weather.units = "kelvin".to_string();
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("Invalid unit system"));
    }

    #[test]
    fn test_config_validation_timeout() {
        let mut config = CityWeatherConfig::default();
        config.weather.timeout_seconds = 500;
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("timeout cannot exceed"));
    }

    #[test]
    fn test_config_validation_grid() {
        let mut config = CityWeatherConfig::default();
        config.grid.step = 0.0;
        assert!(config.validate().is_err());

        let mut config = CityWeatherConfig::default();
        config.grid.lat_min = 10.0;
        config.grid.lat_max = -10.0;
        assert!(config.validate().is_err());

        let mut config = CityWeatherConfig::default();
        config.grid.lng_max = 200.0;
        assert!(config.validate().is_err());
    }

    #[rstest]
    #[case(1e-9)]
    #[case(0.0005)]
    fn test_config_validation_rejects_tiny_grid_step(#[case] step: f64) {
        let mut config = CityWeatherConfig::default();
        config.grid.step = step;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("finer than the minimum"));
    }

    #[test]
    fn test_config_validation_accepts_minimum_grid_step() {
        let mut config = CityWeatherConfig::default();
        config.grid.step = MIN_GRID_STEP;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_apply_defaults_fills_empty_values() {
        let mut config = CityWeatherConfig::default();
        config.weather.base_url.clear();
        config.weather.units.clear();
        config.logging.format.clear();
        config.apply_defaults();
        assert_eq!(config.weather.base_url, default_weather_base_url());
        assert_eq!(config.weather.units, "imperial");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[weather]
api_key = "file_api_key_123"
units = "metric"

[sampling]
iterations = 7
seed = 42

[grid]
lat_min = -60.0
lat_max = 60.0
"#
        )
        .unwrap();

        let config = CityWeatherConfig::load_from_path(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.weather.api_key.as_deref(), Some("file_api_key_123"));
        assert_eq!(config.weather.units, "metric");
        assert_eq!(config.sampling.iterations, 7);
        assert_eq!(config.sampling.seed, Some(42));
        assert_eq!(config.grid.lat_min, -60.0);
        assert_eq!(config.grid.lng_max, 180.0);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = CityWeatherConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("cityweather"));
            assert!(path.to_string_lossy().contains("config.toml"));
        }
    }
}
