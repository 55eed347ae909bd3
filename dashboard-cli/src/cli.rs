use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use dashboard_core::{
    ChartRenderer, Config, Dashboard, ReadingLog, SearchResponse, StoredReading, Units,
    WeatherSource, search_weather, source_from_config,
};
use inquire::{Password, Text};
use serde::Serialize;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-dashboard", version, about = "Weather dashboard charts")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeatherMap API key and chart output directory.
    Configure,

    /// Metric current weather as the search payload.
    Search { city: String },

    /// Current weather converted from Kelvin.
    Current {
        city: String,

        /// Append the reading to the readings log.
        #[arg(long)]
        record: bool,
    },

    /// The 5-day, 3-hourly forecast.
    Forecast { city: String },

    /// Current weather plus trend, humidity and hourly charts.
    Charts { city: String },

    /// Comparison charts across several cities.
    Compare {
        #[arg(required = true, num_args = 2..)]
        cities: Vec<String>,
    },

    /// Trend labels and temperatures without rendering.
    Trend { city: String },

    /// Previously recorded readings.
    Readings {
        /// Only readings for this city.
        city: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;

        match self.command {
            Command::Configure => configure(config)?,
            Command::Search { city } => {
                let response = match source_from_config(&config) {
                    Ok(source) => search_weather(&source, &city).await,
                    Err(err) => SearchResponse::failure(err.to_string()),
                };
                print_json(&response)?;
                if !response.success {
                    bail!("search for {city:?} failed");
                }
            }
            Command::Current { city, record } => {
                let source = source_from_config(&config)?;
                let weather = source.current_weather(&city, Units::Standard).await?;
                if record {
                    let log = ReadingLog::new(config.readings_file()?);
                    log.append(&StoredReading::capture(&weather))?;
                    tracing::info!(path = %log.path().display(), "reading recorded");
                }
                print_json(&weather)?;
            }
            Command::Forecast { city } => {
                let source = source_from_config(&config)?;
                print_json(&source.forecast(&city).await?)?;
            }
            Command::Charts { city } => {
                let dashboard = dashboard(&config)?;
                print_json(&dashboard.city_report(&city).await?)?;
            }
            Command::Compare { cities } => {
                let dashboard = dashboard(&config)?;
                print_json(&dashboard.compare(&cities).await?)?;
            }
            Command::Trend { city } => {
                let dashboard = dashboard(&config)?;
                print_json(&dashboard.trend(&city).await?)?;
            }
            Command::Readings { city } => {
                let log = ReadingLog::new(config.readings_file()?);
                let readings = match city {
                    Some(city) => log.for_city(&city)?,
                    None => log.load()?,
                };
                print_json(&readings)?;
            }
        }

        Ok(())
    }
}

fn dashboard(config: &Config) -> anyhow::Result<Dashboard<impl WeatherSource>> {
    let source = source_from_config(config)?;
    let renderer = ChartRenderer::from_config(config)?;
    Ok(Dashboard::new(source, renderer))
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    let api_key = Password::new("OpenWeatherMap API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    if api_key.trim().is_empty() {
        bail!("API key must not be empty");
    }
    config.set_api_key(api_key.trim().to_owned());

    let default_dir = config.charts_dir()?.display().to_string();
    let charts_dir = Text::new("Charts directory:")
        .with_default(&default_dir)
        .prompt()
        .context("Failed to read charts directory")?;
    config.charts_dir = Some(charts_dir.into());

    config.save()?;
    eprintln!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}
