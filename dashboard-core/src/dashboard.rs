//! The fetch → render pipeline the web layer calls with a city name.

use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::{
    chart::{ChartArtifact, ChartRenderer, TrendData, trend_data},
    error::{FetchError, RenderError},
    model::{CurrentWeather, ForecastPoint, Units},
    provider::WeatherSource,
};

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Chart paths for one city; a chart is absent when it was skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CityCharts {
    pub temperature_trend: Option<String>,
    pub humidity: Option<String>,
    pub hourly: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CityReport {
    pub weather: CurrentWeather,
    pub forecast: Vec<ForecastPoint>,
    pub charts: CityCharts,
    /// Set when the forecast could not be fetched and charts were omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast_error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComparisonCharts {
    pub temperature: Option<String>,
    pub hourly: Option<String>,
    pub wind_speed: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedCity {
    pub city: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub weather: Vec<CurrentWeather>,
    pub charts: ComparisonCharts,
    pub failed: Vec<FailedCity>,
}

pub struct Dashboard<S> {
    source: S,
    renderer: ChartRenderer,
}

impl<S: WeatherSource> Dashboard<S> {
    pub fn new(source: S, renderer: ChartRenderer) -> Self {
        Self { source, renderer }
    }

    /// Current weather plus the three single-city charts.
    ///
    /// A failed current-weather fetch fails the report; a failed forecast only
    /// drops the charts.
    #[instrument(skip(self))]
    pub async fn city_report(&self, city: &str) -> Result<CityReport, DashboardError> {
        let weather = self.source.current_weather(city, Units::Standard).await?;

        let (forecast, forecast_error) = match self.source.forecast(city).await {
            Ok(points) => (points, None),
            Err(err) => {
                warn!(city, error = %err, "forecast unavailable, omitting charts");
                (Vec::new(), Some(err.to_string()))
            }
        };

        let charts = CityCharts {
            temperature_trend: relative(self.renderer.temperature_trend(&forecast, city)?),
            humidity: relative(self.renderer.humidity(&forecast, city)?),
            hourly: relative(self.renderer.hourly(&forecast, city)?),
        };

        Ok(CityReport { weather, forecast, charts, forecast_error })
    }

    /// Fetch every city and draw the comparison charts over those that succeeded.
    ///
    /// A city named more than once is fetched and charted once.
    #[instrument(skip(self))]
    pub async fn compare(&self, cities: &[String]) -> Result<ComparisonReport, DashboardError> {
        let mut weather = Vec::new();
        let mut forecasts = Vec::new();
        let mut failed = Vec::new();

        let mut seen = HashSet::new();
        for city in cities.iter().filter(|c| seen.insert(c.as_str())) {
            match self.fetch_both(city).await {
                Ok((current, forecast)) => {
                    weather.push((city.clone(), current));
                    forecasts.push((city.clone(), forecast));
                }
                Err(err) => {
                    warn!(city = %city, error = %err, "city dropped from comparison");
                    failed.push(FailedCity { city: city.clone(), error: err.to_string() });
                }
            }
        }

        let charts = ComparisonCharts {
            temperature: relative(self.renderer.comparison(&forecasts)?),
            hourly: relative(self.renderer.hourly_comparison(&forecasts)?),
            wind_speed: relative(self.renderer.wind_speed(&weather)?),
        };
        info!(compared = weather.len(), failed = failed.len(), "comparison rendered");

        Ok(ComparisonReport {
            weather: weather.into_iter().map(|(_, w)| w).collect(),
            charts,
            failed,
        })
    }

    /// Trend labels and temperatures without drawing anything.
    pub async fn trend(&self, city: &str) -> Result<TrendData, DashboardError> {
        let forecast = self.source.forecast(city).await?;
        Ok(trend_data(city, &forecast))
    }

    async fn fetch_both(
        &self,
        city: &str,
    ) -> Result<(CurrentWeather, Vec<ForecastPoint>), FetchError> {
        let current = self.source.current_weather(city, Units::Standard).await?;
        let forecast = self.source.forecast(city).await?;
        Ok((current, forecast))
    }
}

fn relative(artifact: Option<ChartArtifact>) -> Option<String> {
    artifact.map(|a| a.relative_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::tests::renderer;
    use crate::provider::tests::{FakeSource, forecast, weather};
    use tempfile::TempDir;

    fn dashboard(source: FakeSource) -> (TempDir, Dashboard<FakeSource>) {
        let (root, renderer) = renderer();
        (root, Dashboard::new(source, renderer))
    }

    fn two_cities() -> FakeSource {
        FakeSource {
            current: vec![weather("Oslo", 1.0, 5.0), weather("Rome", 18.0, 2.0)],
            forecasts: vec![("Oslo".into(), forecast(40)), ("Rome".into(), forecast(40))],
        }
    }

    #[tokio::test]
    async fn city_report_renders_all_three_charts() {
        let (_root, dash) = dashboard(two_cities());

        let report = dash.city_report("Oslo").await.unwrap();

        assert_eq!(report.weather.city, "Oslo");
        assert_eq!(report.forecast.len(), 40);
        assert_eq!(
            report.charts,
            CityCharts {
                temperature_trend: Some("charts/temp_trend_Oslo.png".into()),
                humidity: Some("charts/humidity_Oslo.png".into()),
                hourly: Some("charts/hourly_Oslo.png".into()),
            }
        );
        assert!(report.forecast_error.is_none());
    }

    #[tokio::test]
    async fn missing_forecast_omits_charts() {
        let source = FakeSource { current: vec![weather("Oslo", 1.0, 5.0)], ..Default::default() };
        let (_root, dash) = dashboard(source);

        let report = dash.city_report("Oslo").await.unwrap();

        assert_eq!(report.charts, CityCharts::default());
        assert_eq!(report.forecast_error.as_deref(), Some("City \"Oslo\" not found"));
    }

    #[tokio::test]
    async fn unknown_city_fails_report() {
        let (_root, dash) = dashboard(FakeSource::default());

        let err = dash.city_report("Atlantis").await.unwrap_err();
        assert!(matches!(err, DashboardError::Fetch(FetchError::CityNotFound(_))));
    }

    #[tokio::test]
    async fn compare_renders_comparison_charts() {
        let (_root, dash) = dashboard(two_cities());

        let report = dash.compare(&["Oslo".into(), "Rome".into()]).await.unwrap();

        assert_eq!(report.weather.len(), 2);
        assert!(report.failed.is_empty());
        assert_eq!(report.charts.temperature.as_deref(), Some("charts/multi_city_comparison.png"));
        assert_eq!(report.charts.hourly.as_deref(), Some("charts/hourly_comparison.png"));
        assert_eq!(report.charts.wind_speed.as_deref(), Some("charts/wind_speed_comparison.png"));
    }

    #[tokio::test]
    async fn compare_lists_failures_and_skips_with_one_city_left() {
        let (_root, dash) = dashboard(two_cities());

        let report = dash.compare(&["Oslo".into(), "Atlantis".into()]).await.unwrap();

        assert_eq!(
            report.failed,
            vec![FailedCity { city: "Atlantis".into(), error: "City \"Atlantis\" not found".into() }]
        );
        assert_eq!(report.charts, ComparisonCharts::default());
    }

    #[tokio::test]
    async fn compare_counts_a_repeated_city_once() {
        let (_root, dash) = dashboard(two_cities());

        let report = dash.compare(&["Oslo".into(), "Oslo".into()]).await.unwrap();

        assert_eq!(report.weather.len(), 1);
        assert!(report.failed.is_empty());
        assert_eq!(report.charts, ComparisonCharts::default());

        let report = dash.compare(&["Oslo".into(), "Rome".into(), "Oslo".into()]).await.unwrap();
        assert_eq!(report.weather.len(), 2);
        assert!(report.charts.temperature.is_some());
    }

    #[tokio::test]
    async fn trend_payload_uses_seven_points() {
        let (_root, dash) = dashboard(two_cities());

        let data = dash.trend("Rome").await.unwrap();
        assert_eq!(data.temperatures, vec![10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0]);
    }
}
