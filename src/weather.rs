//! OpenWeatherMap current-weather client
//!
//! One blocking GET per city, issued sequentially. Any transport failure,
//! non-success status or unparsable body is returned as an API error; there
//! are no retries.

use crate::CityWeatherError;
use crate::config::{CityWeatherConfig, WeatherConfig};
use crate::models::CurrentConditions;
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Weather query URL for one city
#[must_use]
pub fn weather_url(base_url: &str, city: &str, country: &str, units: &str, api_key: &str) -> String {
    format!(
        "{}/weather?q={},{}&units={}&APPID={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(city),
        urlencoding::encode(country),
        units,
        api_key
    )
}

/// Strip the API key from a URL before it is logged
fn redact(url: &str) -> String {
    match url.split_once("APPID=") {
        Some((head, _)) => format!("{head}APPID=***"),
        None => url.to_string(),
    }
}

/// Raw and parsed response for one city
#[derive(Debug, Clone)]
pub struct WeatherResponse {
    pub raw: Value,
    pub conditions: CurrentConditions,
}

/// Blocking client for the current-weather endpoint
pub struct WeatherClient {
    client: Client,
    settings: WeatherConfig,
    api_key: String,
}

impl WeatherClient {
    /// Create a client; fails when no API key is configured
    pub fn new(config: &CityWeatherConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();
        let timeout = Duration::from_secs(config.weather.timeout_seconds.into());

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("cityweather/", env!("CARGO_PKG_VERSION")))
            .build()
            .with_context(|| "Failed to create HTTP client")?;

        Ok(Self {
            client,
            settings: config.weather.clone(),
            api_key,
        })
    }

    /// Query URL for `city`, `country` with this client's settings
    #[must_use]
    pub fn url_for(&self, city: &str, country: &str) -> String {
        weather_url(
            &self.settings.base_url,
            city,
            country,
            &self.settings.units,
            &self.api_key,
        )
    }

    /// Fetch current conditions for one city
    #[instrument(skip(self))]
    pub fn current_weather(&self, city: &str, country: &str) -> Result<WeatherResponse> {
        let url = self.url_for(city, country);
        debug!("Weather API request URL: {}", redact(&url));

        let start_time = Instant::now();
        let response = self.client.get(&url).send().map_err(|e| {
            CityWeatherError::api(format!("request for {city},{country} failed: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            warn!("Weather API returned {} for {},{}", status, city, country);
            return Err(CityWeatherError::api(format!(
                "HTTP {} for {city},{country}: {}",
                status,
                body.trim()
            ))
            .into());
        }

        let raw: Value = response.json().map_err(|e| {
            CityWeatherError::api(format!("invalid JSON for {city},{country}: {e}"))
        })?;

        let conditions: CurrentConditions = serde_json::from_value(raw.clone()).map_err(|e| {
            CityWeatherError::api(format!(
                "unexpected response shape for {city},{country}: {e}"
            ))
        })?;

        info!(
            "Fetched weather for {},{} in {:.3}s: {} ({})",
            city,
            country,
            start_time.elapsed().as_secs_f64(),
            conditions.main.temp,
            conditions.description().unwrap_or("no description")
        );

        Ok(WeatherResponse { raw, conditions })
    }
}
