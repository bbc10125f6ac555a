//! Nearest-city resolution
//!
//! Maps arbitrary coordinates to the closest known populated place. The
//! gazetteer is a `Country,City,Latitude,Longitude` CSV indexed in an R-tree;
//! nearest neighbours are found in planar latitude/longitude space.

use crate::CityWeatherError;
use crate::config::GazetteerConfig;
use crate::models::{City, Coordinate};
use anyhow::{Context, Result};
use rstar::{AABB, PointDistance, RTree, RTreeObject};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// World city list shipped with the binary
const BUNDLED_CITIES: &str = include_str!("../data/worldcities.csv");

/// Capability of mapping a coordinate to its nearest known city
pub trait CityResolver {
    fn nearest_city(&self, coordinate: Coordinate) -> Result<City>;
}

/// Row layout of the gazetteer CSV
#[derive(Debug, Deserialize)]
struct GazetteerRow {
    #[serde(rename = "Country")]
    country: String,
    #[serde(rename = "City")]
    city: String,
    #[serde(rename = "Latitude")]
    latitude: f64,
    #[serde(rename = "Longitude")]
    longitude: f64,
}

impl From<GazetteerRow> for City {
    fn from(row: GazetteerRow) -> Self {
        City::new(
            &row.city.trim().to_lowercase(),
            &row.country.trim().to_lowercase(),
            row.latitude,
            row.longitude,
        )
    }
}

/// Point entry stored in the R-tree
#[derive(Debug, Clone)]
struct GazetteerEntry(City);

impl RTreeObject for GazetteerEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.0.latitude, self.0.longitude])
    }
}

impl PointDistance for GazetteerEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.0.latitude - point[0];
        let dy = self.0.longitude - point[1];
        dx * dx + dy * dy
    }
}

/// In-memory city index answering nearest-city queries
pub struct Gazetteer {
    tree: RTree<GazetteerEntry>,
}

impl Gazetteer {
    /// Load the gazetteer named by the configuration, or the bundled list
    pub fn load(config: &GazetteerConfig) -> Result<Self> {
        match &config.path {
            Some(path) => Self::from_path(path),
            None => Self::bundled(),
        }
    }

    /// Gazetteer built from the bundled world city list
    pub fn bundled() -> Result<Self> {
        let gazetteer = Self::from_reader(BUNDLED_CITIES.as_bytes())
            .with_context(|| "Failed to parse bundled city list")?;
        info!("Loaded {} cities from bundled gazetteer", gazetteer.len());
        Ok(gazetteer)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(CityWeatherError::from)
            .with_context(|| format!("Failed to open gazetteer {}", path.display()))?;
        let gazetteer = Self::from_reader(file)
            .with_context(|| format!("Failed to parse gazetteer {}", path.display()))?;
        info!(
            "Loaded {} cities from {}",
            gazetteer.len(),
            path.display()
        );
        Ok(gazetteer)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let mut cities = Vec::new();
        for (line, row) in rdr.deserialize::<GazetteerRow>().enumerate() {
            let row = row.with_context(|| format!("Invalid gazetteer row {}", line + 2))?;
            cities.push(City::from(row));
        }

        Ok(Self::from_cities(cities))
    }

    #[must_use]
    pub fn from_cities(cities: Vec<City>) -> Self {
        let entries = cities.into_iter().map(GazetteerEntry).collect();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl CityResolver for Gazetteer {
    fn nearest_city(&self, coordinate: Coordinate) -> Result<City> {
        let entry = self
            .tree
            .nearest_neighbor(&[coordinate.latitude, coordinate.longitude])
            .ok_or_else(|| {
                CityWeatherError::resolve(format!(
                    "no city known near {}",
                    coordinate.format_coordinates()
                ))
            })?;

        debug!(
            "Nearest city to ({}) is {}, {}",
            coordinate.format_coordinates(),
            entry.0.name,
            entry.0.country_code
        );

        Ok(entry.0.clone())
    }
}
