use anyhow::Context;
use std::path::Path;
use tracing::debug;

use crate::{
    Config,
    error::RenderError,
    model::{CurrentWeather, ForecastPoint},
};

pub mod output;
pub mod png;
pub mod spec;

pub use output::{ChartArtifact, ChartOutput};
pub use png::PngBackend;
pub use spec::{ChartKind, ChartSpec, Series, SeriesStyle, TrendData, trend_data};

/// Turns a [`ChartSpec`] into an image file at `target`.
pub trait ChartBackend: Send + Sync {
    fn draw(&self, spec: &ChartSpec, target: &Path) -> Result<(), RenderError>;
}

/// Renders the dashboard charts into the charts directory.
///
/// Every operation returns `Ok(None)` when there is too little data to draw,
/// and propagates I/O or drawing failures.
pub struct ChartRenderer {
    output: ChartOutput,
    backend: Box<dyn ChartBackend>,
}

impl ChartRenderer {
    pub fn new(output: ChartOutput, backend: Box<dyn ChartBackend>) -> Self {
        Self { output, backend }
    }

    /// PNG renderer writing to the configured charts directory.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let dir = config.charts_dir()?;
        let backend = PngBackend::init(config.font_path.as_deref())
            .context("Failed to initialise chart rendering")?;

        Ok(Self::new(ChartOutput::new(dir), Box::new(backend)))
    }

    pub fn temperature_trend(
        &self,
        forecast: &[ForecastPoint],
        city: &str,
    ) -> Result<Option<ChartArtifact>, RenderError> {
        self.render(ChartKind::TemperatureTrend, ChartSpec::temperature_trend(forecast, city))
    }

    pub fn humidity(
        &self,
        forecast: &[ForecastPoint],
        city: &str,
    ) -> Result<Option<ChartArtifact>, RenderError> {
        self.render(ChartKind::Humidity, ChartSpec::humidity(forecast, city))
    }

    pub fn hourly(
        &self,
        forecast: &[ForecastPoint],
        city: &str,
    ) -> Result<Option<ChartArtifact>, RenderError> {
        self.render(ChartKind::Hourly, ChartSpec::hourly(forecast, city))
    }

    pub fn comparison(
        &self,
        cities: &[(String, Vec<ForecastPoint>)],
    ) -> Result<Option<ChartArtifact>, RenderError> {
        self.render(ChartKind::MultiCityComparison, ChartSpec::comparison(cities))
    }

    pub fn hourly_comparison(
        &self,
        cities: &[(String, Vec<ForecastPoint>)],
    ) -> Result<Option<ChartArtifact>, RenderError> {
        self.render(ChartKind::HourlyComparison, ChartSpec::hourly_comparison(cities))
    }

    pub fn wind_speed(
        &self,
        cities: &[(String, CurrentWeather)],
    ) -> Result<Option<ChartArtifact>, RenderError> {
        self.render(ChartKind::WindSpeed, ChartSpec::wind_speed(cities))
    }

    fn render(
        &self,
        kind: ChartKind,
        spec: Option<ChartSpec>,
    ) -> Result<Option<ChartArtifact>, RenderError> {
        let Some(spec) = spec else {
            debug!(?kind, "not enough data, chart skipped");
            return Ok(None);
        };

        let artifact =
            self.output.write(&spec.file_name, |target| self.backend.draw(&spec, target))?;

        Ok(Some(artifact))
    }
}
