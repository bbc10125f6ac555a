//! Error types and handling for the `cityweather` tool

use thiserror::Error;

/// Main error type for the `cityweather` tool
#[derive(Error, Debug)]
pub enum CityWeatherError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Weather API communication errors
    #[error("API error: {message}")]
    Api { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Nearest-city resolution errors
    #[error("Resolve error: {message}")]
    Resolve { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl CityWeatherError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new resolve error
    pub fn resolve<S: Into<String>>(message: S) -> Self {
        Self::Resolve {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            CityWeatherError::Config { message } => {
                format!("Configuration error: {message}. Please check your config file and API key.")
            }
            CityWeatherError::Api { message } => {
                format!("Weather API request failed: {message}")
            }
            CityWeatherError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            CityWeatherError::Resolve { message } => {
                format!("Could not resolve a nearby city: {message}")
            }
            CityWeatherError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = CityWeatherError::config("missing API key");
        assert!(matches!(config_err, CityWeatherError::Config { .. }));

        let api_err = CityWeatherError::api("HTTP 500");
        assert!(matches!(api_err, CityWeatherError::Api { .. }));

        let resolve_err = CityWeatherError::resolve("empty gazetteer");
        assert!(matches!(resolve_err, CityWeatherError::Resolve { .. }));
    }

    #[test]
    fn test_user_messages() {
        let config_err = CityWeatherError::config("weather.api_key is not set");
        assert!(config_err.user_message().contains("Configuration error"));
        assert!(config_err.user_message().contains("weather.api_key"));

        let api_err = CityWeatherError::api("HTTP 401 Unauthorized");
        assert!(api_err.user_message().contains("HTTP 401"));

        let validation_err = CityWeatherError::validation("test input");
        assert!(validation_err.user_message().contains("test input"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CityWeatherError = io_err.into();
        assert!(matches!(err, CityWeatherError::Io { .. }));
    }
}
