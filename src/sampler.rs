//! Coordinate sampling
//!
//! Latitude and longitude values are precomputed on a fixed-resolution grid
//! once; each draw then picks one value from each axis independently and
//! uniformly. Repeated coordinates across draws are possible.

use crate::CityWeatherError;
use crate::config::GridConfig;
use crate::models::Coordinate;
use anyhow::Result;
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use tracing::debug;

/// Upper bound on values per axis; 0.001 over 360 degrees fits
const MAX_AXIS_VALUES: usize = 1_000_000;

/// Precomputed latitude and longitude axes
#[derive(Debug, Clone)]
pub struct CoordinateGrid {
    latitudes: Vec<f64>,
    longitudes: Vec<f64>,
}

impl CoordinateGrid {
    /// Build the grid from configured bounds, `[min, max)` on both axes
    pub fn new(config: &GridConfig) -> Result<Self> {
        let latitudes = axis(config.lat_min, config.lat_max, config.step)?;
        let longitudes = axis(config.lng_min, config.lng_max, config.step)?;

        debug!(
            "Built coordinate grid: {} latitudes x {} longitudes (step {})",
            latitudes.len(),
            longitudes.len(),
            config.step
        );

        Ok(Self {
            latitudes,
            longitudes,
        })
    }

    #[must_use]
    pub fn latitudes(&self) -> &[f64] {
        &self.latitudes
    }

    #[must_use]
    pub fn longitudes(&self) -> &[f64] {
        &self.longitudes
    }

    /// Draw one random coordinate from the grid
    pub fn sample<R: RngExt>(&self, rng: &mut R) -> Coordinate {
        let latitude = self.latitudes[rng.random_range(0..self.latitudes.len())];
        let longitude = self.longitudes[rng.random_range(0..self.longitudes.len())];
        Coordinate::new(latitude, longitude)
    }
}

/// Evenly spaced values from `min` (inclusive) to `max` (exclusive)
fn axis(min: f64, max: f64, step: f64) -> Result<Vec<f64>> {
    if !(step > 0.0) || !(min < max) {
        return Err(CityWeatherError::validation(format!(
            "Invalid grid axis: min={min}, max={max}, step={step}"
        ))
        .into());
    }

    // Epsilon keeps 180 / 0.1 at exactly 1800 values despite rounding error
    let count = ((max - min) / step - 1e-9).ceil();
    if count > MAX_AXIS_VALUES as f64 {
        return Err(CityWeatherError::validation(format!(
            "Grid axis [{min}, {max}) with step {step} would hold {count} values (max {MAX_AXIS_VALUES})"
        ))
        .into());
    }

    let count = count as usize;
    let values: Vec<f64> = (0..count)
        .map(|i| min + i as f64 * step)
        .filter(|value| *value < max)
        .collect();

    if values.is_empty() {
        return Err(CityWeatherError::validation(format!(
            "Grid axis [{min}, {max}) with step {step} is empty"
        ))
        .into());
    }

    Ok(values)
}

/// Seeded generator for a run, plus the seed actually used
#[must_use]
pub fn seeded_rng(seed: Option<u64>) -> (StdRng, u64) {
    let seed = seed.unwrap_or_else(|| rand::rng().random::<u64>());
    (StdRng::seed_from_u64(seed), seed)
}
