//! Data models for the cityweather tool
//!
//! - Location: sampled coordinates
//! - City: resolved places and the rows of the collected city table
//! - Weather: current-conditions payload of the weather API

pub mod city;
pub mod location;
pub mod weather;

// Re-export all public types for convenient access
pub use city::{City, CityRecord};
pub use location::Coordinate;
pub use weather::CurrentConditions;
