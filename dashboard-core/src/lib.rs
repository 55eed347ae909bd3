//! Core library for the weather dashboard.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather fetcher behind the `WeatherSource` trait
//! - Chart rendering from forecast data into PNG files
//! - The dashboard pipeline tying the two together
//!
//! It is used by `dashboard-cli`, but can also be called from a web layer.

pub mod chart;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod model;
pub mod provider;
pub mod storage;
pub mod units;

pub use chart::{ChartArtifact, ChartRenderer};
pub use config::Config;
pub use dashboard::{CityReport, ComparisonReport, Dashboard, DashboardError};
pub use error::{FetchError, RenderError};
pub use model::{CurrentWeather, ForecastPoint, SearchResponse, Units};
pub use provider::{WeatherSource, search_weather, source_from_config};
pub use storage::{City, ReadingLog, StoredReading};
pub use units::kelvin_to_celsius;
