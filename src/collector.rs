//! City collection and deduplication
//!
//! Samples coordinates, resolves each to its nearest city and appends the
//! city to an ordered table unless a row with the same unique key exists.

use crate::location_resolver::CityResolver;
use crate::models::{CityRecord, CurrentConditions};
use crate::sampler::CoordinateGrid;
use anyhow::Result;
use rand::RngExt;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// How long the collector keeps drawing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleMode {
    /// Exactly this many draws; duplicates shrink the table
    Iterations(usize),
    /// Draw until `target` unique cities are found or `max_draws` is spent
    UntilUnique { target: usize, max_draws: usize },
}

impl SampleMode {
    #[must_use]
    pub fn from_settings(count: usize, until_unique: bool, max_draws_per_city: usize) -> Self {
        if until_unique {
            Self::UntilUnique {
                target: count,
                max_draws: count.saturating_mul(max_draws_per_city),
            }
        } else {
            Self::Iterations(count)
        }
    }
}

/// Append-only table of unique cities
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct CityTable {
    rows: Vec<CityRecord>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl CityTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `record` unless its unique key is already present.
    /// Returns whether the row was added.
    pub fn insert(&mut self, record: CityRecord) -> bool {
        if self.index.contains_key(&record.unique_key) {
            return false;
        }
        self.index.insert(record.unique_key.clone(), self.rows.len());
        self.rows.push(record);
        true
    }

    #[must_use]
    pub fn contains(&self, unique_key: &str) -> bool {
        self.index.contains_key(unique_key)
    }

    #[must_use]
    pub fn get(&self, unique_key: &str) -> Option<&CityRecord> {
        self.index.get(unique_key).map(|&i| &self.rows[i])
    }

    #[must_use]
    pub fn rows(&self) -> &[CityRecord] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Fill the weather columns of the row at `position`
    pub fn record_weather(&mut self, position: usize, conditions: &CurrentConditions) {
        if let Some(row) = self.rows.get_mut(position) {
            row.temp = Some(conditions.main.temp);
            row.description = conditions.description().map(str::to_string);
        }
    }
}

/// Result of a collection run
#[derive(Debug, Clone)]
pub struct Collection {
    pub table: CityTable,
    /// Coordinates drawn
    pub draws: usize,
    /// Draws whose city was already in the table
    pub duplicates: usize,
}

/// Sample coordinates and collect the unique cities they resolve to
pub fn collect_cities<C, R>(
    grid: &CoordinateGrid,
    resolver: &C,
    rng: &mut R,
    mode: SampleMode,
) -> Result<Collection>
where
    C: CityResolver + ?Sized,
    R: RngExt,
{
    let (target, max_draws) = match mode {
        SampleMode::Iterations(count) => (None, count),
        SampleMode::UntilUnique { target, max_draws } => (Some(target), max_draws),
    };

    info!("Collecting cities ({:?})", mode);

    let mut table = CityTable::new();
    let mut draws = 0;
    let mut duplicates = 0;

    while draws < max_draws {
        if target.is_some_and(|target| table.len() >= target) {
            break;
        }

        let sample = grid.sample(rng);
        draws += 1;

        let city = resolver.nearest_city(sample)?;
        let record = CityRecord::from_sample(&city, sample);

        if table.insert(record) {
            debug!(
                "Draw {}: ({}) -> {}, {}",
                draws,
                sample.format_coordinates(),
                city.name,
                city.country_code
            );
        } else {
            duplicates += 1;
            debug!(
                "Draw {}: ({}) -> {}, {} already collected, skipping",
                draws,
                sample.format_coordinates(),
                city.name,
                city.country_code
            );
        }
    }

    if let Some(target) = target {
        if table.len() < target {
            warn!(
                "Draw budget of {} exhausted with {} of {} unique cities",
                max_draws,
                table.len(),
                target
            );
        }
    }

    info!(
        "Collected {} unique cities from {} draws ({} duplicates)",
        table.len(),
        draws,
        duplicates
    );

    Ok(Collection {
        table,
        draws,
        duplicates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CityWeatherError;
    use crate::config::GridConfig;
    use crate::location_resolver::Gazetteer;
    use crate::models::{City, Coordinate};
    use crate::sampler::seeded_rng;
    use rstest::rstest;
    use std::collections::HashSet;

    /// Resolves by latitude band so only `cities.len()` distinct answers exist
    struct BandResolver {
        cities: Vec<City>,
    }

    impl BandResolver {
        fn with_cities(count: usize) -> Self {
            let cities = (0..count)
                .map(|i| City::new(&format!("city{i}"), "xx", 0.0, 0.0))
                .collect();
            Self { cities }
        }
    }

    impl CityResolver for BandResolver {
        fn nearest_city(&self, coordinate: Coordinate) -> Result<City> {
            let band = ((coordinate.latitude + 90.0) / 180.0 * self.cities.len() as f64) as usize;
            Ok(self.cities[band.min(self.cities.len() - 1)].clone())
        }
    }

    struct FailingResolver;

    impl CityResolver for FailingResolver {
        fn nearest_city(&self, coordinate: Coordinate) -> Result<City> {
            Err(CityWeatherError::resolve(coordinate.format_coordinates()).into())
        }
    }

    fn grid() -> CoordinateGrid {
        CoordinateGrid::new(&GridConfig::default()).unwrap()
    }

    #[test]
    fn test_zero_iterations_gives_empty_table() {
        let (mut rng, _) = seeded_rng(Some(1));
        let collection =
            collect_cities(&grid(), &BandResolver::with_cities(3), &mut rng, SampleMode::Iterations(0))
                .unwrap();
        assert!(collection.table.is_empty());
        assert_eq!(collection.draws, 0);
    }

    #[rstest]
    #[case(1, 50)]
    #[case(3, 50)]
    #[case(100, 50)]
    #[case(1000, 5)]
    fn test_rows_are_unique_and_bounded(#[case] cities: usize, #[case] iterations: usize) {
        let (mut rng, _) = seeded_rng(Some(99));
        let collection = collect_cities(
            &grid(),
            &BandResolver::with_cities(cities),
            &mut rng,
            SampleMode::Iterations(iterations),
        )
        .unwrap();

        let table = &collection.table;
        assert!(table.len() <= iterations);
        assert!(table.len() <= cities);
        assert_eq!(collection.draws, iterations);
        assert_eq!(table.len() + collection.duplicates, iterations);

        let keys: HashSet<&str> = table.rows().iter().map(|r| r.unique_key.as_str()).collect();
        assert_eq!(keys.len(), table.len());
    }

    #[test]
    fn test_duplicates_are_skipped() {
        let (mut rng, _) = seeded_rng(Some(5));
        let collection = collect_cities(
            &grid(),
            &BandResolver::with_cities(1),
            &mut rng,
            SampleMode::Iterations(10),
        )
        .unwrap();
        assert_eq!(collection.table.len(), 1);
        assert_eq!(collection.duplicates, 9);
        assert!(collection.table.contains("city0xx"));
    }

    #[test]
    fn test_fixed_seed_is_deterministic() {
        let gazetteer = Gazetteer::bundled().unwrap();
        let run = || {
            let (mut rng, _) = seeded_rng(Some(2024));
            collect_cities(&grid(), &gazetteer, &mut rng, SampleMode::Iterations(5)).unwrap()
        };

        let first = run();
        let second = run();
        assert!(first.table.len() <= 5);
        assert_eq!(first.table.rows(), second.table.rows());
    }

    #[test]
    fn test_until_unique_reaches_target() {
        let (mut rng, _) = seeded_rng(Some(11));
        let collection = collect_cities(
            &grid(),
            &BandResolver::with_cities(20),
            &mut rng,
            SampleMode::UntilUnique {
                target: 5,
                max_draws: 10_000,
            },
        )
        .unwrap();
        assert_eq!(collection.table.len(), 5);
    }

    #[test]
    fn test_until_unique_stops_at_draw_budget() {
        let (mut rng, _) = seeded_rng(Some(11));
        let collection = collect_cities(
            &grid(),
            &BandResolver::with_cities(2),
            &mut rng,
            SampleMode::UntilUnique {
                target: 5,
                max_draws: 40,
            },
        )
        .unwrap();
        assert!(collection.table.len() <= 2);
        assert_eq!(collection.draws, 40);
    }

    #[test]
    fn test_resolver_failure_ends_collection() {
        let (mut rng, _) = seeded_rng(Some(3));
        let err = collect_cities(&grid(), &FailingResolver, &mut rng, SampleMode::Iterations(3))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CityWeatherError>(),
            Some(CityWeatherError::Resolve { .. })
        ));
    }

    #[test]
    fn test_sample_mode_from_settings() {
        assert_eq!(SampleMode::from_settings(5, false, 100), SampleMode::Iterations(5));
        assert_eq!(
            SampleMode::from_settings(5, true, 100),
            SampleMode::UntilUnique {
                target: 5,
                max_draws: 500
            }
        );
    }

    #[test]
    fn test_record_weather_fills_row() {
        let mut table = CityTable::new();
        let city = City::new("luderitz", "na", -26.6481, 15.1594);
        assert!(table.insert(CityRecord::from_sample(&city, Coordinate::new(-27.0, 14.0))));
        assert!(!table.insert(CityRecord::from_sample(&city, Coordinate::new(-26.0, 15.0))));

        let conditions: CurrentConditions = serde_json::from_str(
            r#"{"main": {"temp": 61.5}, "weather": [{"main": "Clouds", "description": "few clouds"}]}"#,
        )
        .unwrap();
        table.record_weather(0, &conditions);

        let row = table.get("luderitzna").unwrap();
        assert_eq!(row.temp, Some(61.5));
        assert_eq!(row.description.as_deref(), Some("few clouds"));
        assert_eq!(row.rand_lat, -27.0);
    }
}
