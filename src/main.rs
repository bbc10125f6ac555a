use anyhow::Result;
use cityweather::config::CityWeatherConfig;
use cityweather::{CityWeatherError, Gazetteer, WeatherClient, logging, pipeline, report, weather};
use clap::{Args, Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

/// Sample random cities around the globe and fetch their current weather
#[derive(Parser)]
#[command(name = "cityweather", author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true, env = "CITYWEATHER_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sample and deduplicate cities without calling the weather API
    Sample(SampleArgs),
    /// Sample cities and fetch current weather for each
    Run {
        #[command(flatten)]
        sampling: SampleArgs,

        /// Write the final table as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the weather query URL for a city
    Url {
        /// City name, e.g. "luderitz"
        city: String,
        /// Country code, e.g. "na"
        country: String,
    },
}

#[derive(Args)]
struct SampleArgs {
    /// Number of coordinate draws (target unique cities with --until-unique)
    #[arg(short = 'n', long)]
    count: Option<usize>,

    /// RNG seed for a reproducible run
    #[arg(short, long)]
    seed: Option<u64>,

    /// Keep sampling until COUNT unique cities are collected
    #[arg(long)]
    until_unique: bool,
}

impl SampleArgs {
    fn apply(&self, config: &mut CityWeatherConfig) {
        if let Some(count) = self.count {
            config.sampling.iterations = count;
        }
        if self.seed.is_some() {
            config.sampling.seed = self.seed;
        }
        if self.until_unique {
            config.sampling.until_unique = true;
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<CityWeatherError>() {
                Some(app_err) => eprintln!("Error: {}", app_err.user_message()),
                None => eprintln!("Error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = CityWeatherConfig::load_from_path(cli.config.clone())?;
    logging::init(&config.logging, cli.verbose)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Sample(args) => {
            args.apply(&mut config);
            let gazetteer = Gazetteer::load(&config.gazetteer)?;
            let collection = pipeline::sample_cities(&config, &gazetteer)?;
            write!(out, "{}", report::render_table(&collection.table))?;
            writeln!(
                out,
                "{} unique cities from {} draws",
                collection.table.len(),
                collection.draws
            )?;
        }
        Commands::Run { sampling, output } => {
            sampling.apply(&mut config);
            let client = WeatherClient::new(&config)?;
            let gazetteer = Gazetteer::load(&config.gazetteer)?;
            let table = pipeline::run(&config, &gazetteer, &client, &mut out)?;
            if let Some(path) = output {
                report::write_json(&table, &path)?;
            }
        }
        Commands::Url { city, country } => {
            let api_key = config.require_api_key()?;
            writeln!(
                out,
                "{}",
                weather::weather_url(
                    &config.weather.base_url,
                    &city,
                    &country,
                    &config.weather.units,
                    api_key
                )
            )?;
        }
    }

    out.flush()?;
    Ok(())
}
