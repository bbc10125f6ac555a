//! `cityweather` - sample random cities around the globe and fetch their current weather
//!
//! Random coordinates are drawn from a fixed-resolution grid, resolved to the
//! nearest known city, deduplicated, and queried against the OpenWeatherMap
//! current-weather API one city at a time.

pub mod collector;
pub mod config;
pub mod error;
pub mod location_resolver;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod sampler;
pub mod weather;

// Re-export core types for public API
pub use collector::{CityTable, Collection, SampleMode};
pub use config::CityWeatherConfig;
pub use error::CityWeatherError;
pub use location_resolver::{CityResolver, Gazetteer};
pub use models::{City, CityRecord, Coordinate, CurrentConditions};
pub use sampler::CoordinateGrid;
pub use weather::WeatherClient;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
