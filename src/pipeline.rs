//! The collection pipeline: build the grid, sample unique cities, fetch
//! their weather. Everything runs sequentially on the calling thread.

use crate::collector::{CityTable, Collection, SampleMode, collect_cities};
use crate::config::CityWeatherConfig;
use crate::location_resolver::CityResolver;
use crate::report;
use crate::sampler::{CoordinateGrid, seeded_rng};
use crate::weather::WeatherClient;
use anyhow::{Context, Result};
use std::io::Write;
use tracing::{debug, info};

/// Sample cities using the sampling and grid settings from `config`
pub fn sample_cities<C>(config: &CityWeatherConfig, resolver: &C) -> Result<Collection>
where
    C: CityResolver + ?Sized,
{
    let grid = CoordinateGrid::new(&config.grid)?;
    let (mut rng, seed) = seeded_rng(config.sampling.seed);
    info!("Sampling with seed {}", seed);

    let mode = SampleMode::from_settings(
        config.sampling.iterations,
        config.sampling.until_unique,
        config.sampling.max_draws_per_city,
    );

    collect_cities(&grid, resolver, &mut rng, mode)
}

/// Fetch current weather for every row, printing each raw response to `out`
pub fn fetch_weather<W: Write>(
    client: &WeatherClient,
    table: &mut CityTable,
    out: &mut W,
) -> Result<()> {
    info!("Fetching weather for {} cities", table.len());

    for position in 0..table.len() {
        let (city, country) = {
            let row = &table.rows()[position];
            (row.city_name.clone(), row.country_code.clone())
        };

        writeln!(out, "Processing record {} | {},{}", position, city, country)?;
        let response = client.current_weather(&city, &country)?;

        if let Some(observed_at) = response.conditions.observed_at() {
            debug!("{},{} observed at {}", city, country, observed_at);
        }

        let raw = serde_json::to_string_pretty(&response.raw)
            .with_context(|| format!("Failed to format response for {city},{country}"))?;
        writeln!(out, "{raw}")?;

        table.record_weather(position, &response.conditions);
    }

    Ok(())
}

/// Full run: sample, print the intermediate table, fetch weather, print the final table
pub fn run<C, W>(
    config: &CityWeatherConfig,
    resolver: &C,
    client: &WeatherClient,
    out: &mut W,
) -> Result<CityTable>
where
    C: CityResolver + ?Sized,
    W: Write,
{
    let Collection { mut table, .. } = sample_cities(config, resolver)?;
    write!(out, "{}", report::render_table(&table))?;

    fetch_weather(client, &mut table, out)?;
    write!(out, "{}", report::render_table(&table))?;

    Ok(table)
}
