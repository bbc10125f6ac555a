//! Current weather payload returned by the OpenWeatherMap `weather` endpoint

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Subset of the current-weather response used to fill the city table
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CurrentConditions {
    /// City name as known by the weather service
    #[serde(default)]
    pub name: Option<String>,
    /// Observation time, Unix seconds
    #[serde(default)]
    pub dt: Option<i64>,
    pub main: MainReadings,
    #[serde(default)]
    pub weather: Vec<WeatherSummary>,
    #[serde(default)]
    pub wind: Option<Wind>,
    #[serde(default)]
    pub sys: Option<SysInfo>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MainReadings {
    pub temp: f64,
    #[serde(default)]
    pub feels_like: Option<f64>,
    #[serde(default)]
    pub temp_min: Option<f64>,
    #[serde(default)]
    pub temp_max: Option<f64>,
    #[serde(default)]
    pub pressure: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WeatherSummary {
    #[serde(default)]
    pub main: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Wind {
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub deg: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SysInfo {
    #[serde(default)]
    pub country: Option<String>,
}

impl CurrentConditions {
    /// First weather description, if the response carried any
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.weather
            .first()
            .map(|summary| summary.description.as_str())
            .filter(|description| !description.is_empty())
    }

    #[must_use]
    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        self.dt.and_then(|seconds| DateTime::from_timestamp(seconds, 0))
    }
}
