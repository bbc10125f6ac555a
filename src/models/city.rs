//! City model: resolved places and rows of the collected city table

use super::Coordinate;
use serde::{Deserialize, Serialize};

/// A known populated place, as returned by a nearest-city lookup
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct City {
    /// City name (lowercase, as listed in the gazetteer)
    pub name: String,
    /// Country code (ISO 3166-1 alpha-2, lowercase)
    pub country_code: String,
    /// Latitude of the city in decimal degrees
    pub latitude: f64,
    /// Longitude of the city in decimal degrees
    pub longitude: f64,
}

impl City {
    #[must_use]
    pub fn new(name: &str, country_code: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.to_string(),
            country_code: country_code.to_string(),
            latitude,
            longitude,
        }
    }

    #[must_use]
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// Deduplication key: city name followed by country code
    #[must_use]
    pub fn unique_key(&self) -> String {
        format!("{}{}", self.name, self.country_code)
    }
}

/// One row of the city table
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CityRecord {
    pub city_name: String,
    pub country_code: String,
    /// Latitude of the random sample that resolved to this city
    pub rand_lat: f64,
    /// Longitude of the random sample that resolved to this city
    pub rand_lng: f64,
    pub unique_key: String,
    pub city_lat: f64,
    pub city_lng: f64,
    /// Great-circle distance from the sample to the city
    pub distance_km: f64,
    /// Current temperature in the configured unit system, once fetched
    pub temp: Option<f64>,
    /// Short weather description, once fetched
    pub description: Option<String>,
}

impl CityRecord {
    /// Build a row for `city` found from the random `sample`
    #[must_use]
    pub fn from_sample(city: &City, sample: Coordinate) -> Self {
        Self {
            city_name: city.name.clone(),
            country_code: city.country_code.clone(),
            rand_lat: sample.latitude,
            rand_lng: sample.longitude,
            unique_key: city.unique_key(),
            city_lat: city.latitude,
            city_lng: city.longitude,
            distance_km: sample.distance_km(&city.coordinate()),
            temp: None,
            description: None,
        }
    }
}
