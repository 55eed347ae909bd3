//! Backend-independent chart descriptions built from forecast data.
//!
//! Everything here is pure: windowing, labels, colours and the guard that
//! skips charts with too little data. Drawing lives in [`super::png`].

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::model::{CurrentWeather, ForecastPoint};

/// Points used by the day-labelled charts (trend, humidity, comparison).
pub const DAILY_WINDOW: usize = 7;
/// Points used by the time-labelled charts: 24 hours at 3-hour cadence.
pub const HOURLY_WINDOW: usize = 8;
/// Fewer forecast points than this and a chart is skipped.
pub const MIN_POINTS: usize = 2;
/// Comparison charts need at least this many distinct cities.
pub const MIN_CITIES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

pub const TREND_COLOR: Rgb = Rgb(0xFF, 0x6B, 0x6B);
pub const HUMIDITY_COLOR: Rgb = Rgb(0x4E, 0xCD, 0xC4);
pub const HOURLY_COLOR: Rgb = Rgb(0xF3, 0x81, 0x81);
pub const WIND_COLOR: Rgb = Rgb(0x95, 0xE1, 0xD3);

/// Line colours for multi-city charts, cycled by city index.
pub const PALETTE: [Rgb; 5] = [
    Rgb(0xFF, 0x6B, 0x6B),
    Rgb(0x4E, 0xCD, 0xC4),
    Rgb(0x45, 0xB7, 0xD1),
    Rgb(0xFF, 0xA0, 0x7A),
    Rgb(0x98, 0xD8, 0xC8),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    TemperatureTrend,
    Humidity,
    Hourly,
    MultiCityComparison,
    HourlyComparison,
    WindSpeed,
}

impl ChartKind {
    /// Output file name. Per-city kinds embed the subject; comparisons use a
    /// fixed name.
    pub fn file_name(&self, subject: &str) -> String {
        match self {
            Self::TemperatureTrend => format!("temp_trend_{}.png", file_safe(subject)),
            Self::Humidity => format!("humidity_{}.png", file_safe(subject)),
            Self::Hourly => format!("hourly_{}.png", file_safe(subject)),
            Self::MultiCityComparison => "multi_city_comparison.png".to_string(),
            Self::HourlyComparison => "hourly_comparison.png".to_string(),
            Self::WindSpeed => "wind_speed_comparison.png".to_string(),
        }
    }
}

/// Spaces become underscores; path separators are replaced as well so a city
/// name can never leave the charts directory.
fn file_safe(subject: &str) -> String {
    subject
        .trim()
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>()
        .replace("..", "_")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesStyle {
    /// Line with filled circular markers.
    LineMarkers,
    /// Thick line, hollow markers and a translucent fill down to zero.
    FilledArea,
    /// Vertical bars with a text label above each.
    Bars,
}

impl SeriesStyle {
    fn anchored_at_zero(&self) -> bool {
        matches!(self, Self::FilledArea | Self::Bars)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    /// Legend entry; unlabelled series get no legend.
    pub label: Option<String>,
    pub color: Rgb,
    pub style: SeriesStyle,
    /// One value per category, starting at the first category.
    pub values: Vec<f64>,
    /// Text drawn above each bar; empty for line styles.
    pub value_labels: Vec<String>,
}

/// Everything a backend needs to draw one chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub file_name: String,
    pub title: String,
    pub x_desc: String,
    pub y_desc: String,
    /// Pixel size of the image.
    pub size: (u32, u32),
    /// X-axis labels, one per slot.
    pub categories: Vec<String>,
    pub series: Vec<Series>,
    /// Fixed y-axis range; auto-scaled when `None`.
    pub y_range: Option<(f64, f64)>,
}

impl ChartSpec {
    pub fn temperature_trend(forecast: &[ForecastPoint], city: &str) -> Option<Self> {
        let window = window(forecast, DAILY_WINDOW)?;

        Some(Self {
            kind: ChartKind::TemperatureTrend,
            file_name: ChartKind::TemperatureTrend.file_name(city),
            title: format!("7-Day Temperature Forecast - {city}"),
            x_desc: "Date".into(),
            y_desc: "Temperature (°C)".into(),
            size: (1000, 500),
            categories: window.iter().map(ForecastPoint::date_label).collect(),
            series: vec![Series {
                label: None,
                color: TREND_COLOR,
                style: SeriesStyle::LineMarkers,
                values: window.iter().map(|p| p.temperature).collect(),
                value_labels: Vec::new(),
            }],
            y_range: None,
        })
    }

    pub fn humidity(forecast: &[ForecastPoint], city: &str) -> Option<Self> {
        let window = window(forecast, DAILY_WINDOW)?;

        Some(Self {
            kind: ChartKind::Humidity,
            file_name: ChartKind::Humidity.file_name(city),
            title: format!("7-Day Humidity Levels - {city}"),
            x_desc: "Date".into(),
            y_desc: "Humidity (%)".into(),
            size: (1000, 500),
            categories: window.iter().map(ForecastPoint::date_label).collect(),
            series: vec![Series {
                label: None,
                color: HUMIDITY_COLOR,
                style: SeriesStyle::Bars,
                values: window.iter().map(|p| f64::from(p.humidity)).collect(),
                value_labels: window.iter().map(|p| format!("{}%", p.humidity)).collect(),
            }],
            y_range: Some((0.0, 100.0)),
        })
    }

    pub fn hourly(forecast: &[ForecastPoint], city: &str) -> Option<Self> {
        let window = window(forecast, HOURLY_WINDOW)?;

        Some(Self {
            kind: ChartKind::Hourly,
            file_name: ChartKind::Hourly.file_name(city),
            title: format!("24-Hour Temperature Forecast - {city}"),
            x_desc: "Time".into(),
            y_desc: "Temperature (°C)".into(),
            size: (1200, 500),
            categories: window.iter().map(ForecastPoint::time_label).collect(),
            series: vec![Series {
                label: None,
                color: HOURLY_COLOR,
                style: SeriesStyle::FilledArea,
                values: window.iter().map(|p| p.temperature).collect(),
                value_labels: Vec::new(),
            }],
            y_range: None,
        })
    }

    /// One line per city over the daily window.
    pub fn comparison(cities: &[(String, Vec<ForecastPoint>)]) -> Option<Self> {
        Self::multi_city(
            ChartKind::MultiCityComparison,
            cities,
            DAILY_WINDOW,
            ForecastPoint::date_label,
        )
        .map(|spec| Self {
            title: "Temperature Comparison - Multiple Cities".into(),
            x_desc: "Date".into(),
            ..spec
        })
    }

    /// One line per city over the next 24 hours.
    pub fn hourly_comparison(cities: &[(String, Vec<ForecastPoint>)]) -> Option<Self> {
        Self::multi_city(
            ChartKind::HourlyComparison,
            cities,
            HOURLY_WINDOW,
            ForecastPoint::time_label,
        )
        .map(|spec| Self {
            title: "24-Hour Temperature Comparison".into(),
            x_desc: "Time".into(),
            ..spec
        })
    }

    fn multi_city(
        kind: ChartKind,
        cities: &[(String, Vec<ForecastPoint>)],
        size: usize,
        label: fn(&ForecastPoint) -> String,
    ) -> Option<Self> {
        let cities = distinct(cities);
        if cities.len() < MIN_CITIES {
            return None;
        }

        let mut categories = Vec::new();
        let mut series = Vec::new();

        // Colour follows the city's position even when an earlier city has no data.
        for (idx, (city, forecast)) in cities.into_iter().enumerate() {
            let Some(window) = window(forecast, size) else {
                continue;
            };
            if window.len() > categories.len() {
                categories = window.iter().map(label).collect();
            }
            series.push(Series {
                label: Some(city.clone()),
                color: PALETTE[idx % PALETTE.len()],
                style: SeriesStyle::LineMarkers,
                values: window.iter().map(|p| p.temperature).collect(),
                value_labels: Vec::new(),
            });
        }

        if series.is_empty() {
            return None;
        }

        Some(Self {
            kind,
            file_name: kind.file_name(""),
            title: String::new(),
            x_desc: String::new(),
            y_desc: "Temperature (°C)".into(),
            size: (1200, 600),
            categories,
            series,
            y_range: None,
        })
    }

    /// Bars of current wind speed, one per city.
    pub fn wind_speed(cities: &[(String, CurrentWeather)]) -> Option<Self> {
        let cities = distinct(cities);
        if cities.len() < MIN_CITIES {
            return None;
        }

        Some(Self {
            kind: ChartKind::WindSpeed,
            file_name: ChartKind::WindSpeed.file_name(""),
            title: "Wind Speed Comparison".into(),
            x_desc: "City".into(),
            y_desc: "Wind Speed (m/s)".into(),
            size: (1000, 600),
            categories: cities.iter().map(|(city, _)| city.clone()).collect(),
            series: vec![Series {
                label: None,
                color: WIND_COLOR,
                style: SeriesStyle::Bars,
                values: cities.iter().map(|(_, w)| w.wind_speed).collect(),
                value_labels: cities
                    .iter()
                    .map(|(_, w)| format!("{:.1} m/s", w.wind_speed))
                    .collect(),
            }],
            y_range: None,
        })
    }

    /// Y-axis range: the fixed range if set, otherwise the data padded by 10%
    /// (at least one unit), extended to zero for bars and filled areas.
    pub fn value_range(&self) -> (f64, f64) {
        if let Some(range) = self.y_range {
            return range;
        }

        let (mut lo, mut hi) = self
            .series
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

        if !lo.is_finite() || !hi.is_finite() {
            return (0.0, 1.0);
        }

        let pad = ((hi - lo) * 0.1).max(1.0);
        let anchored = self.series.iter().any(|s| s.style.anchored_at_zero());

        if anchored && lo >= 0.0 {
            lo = 0.0;
        } else {
            lo -= pad;
        }
        if anchored && hi <= 0.0 {
            hi = 0.0;
        } else {
            hi += pad;
        }

        (lo, hi)
    }
}

/// JSON payload behind the temperature-trend endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendData {
    pub city: String,
    pub labels: Vec<String>,
    pub temperatures: Vec<f64>,
}

/// Labels and temperatures over the daily window, without rendering.
pub fn trend_data(city: &str, forecast: &[ForecastPoint]) -> TrendData {
    let window = &forecast[..forecast.len().min(DAILY_WINDOW)];
    TrendData {
        city: city.to_owned(),
        labels: window.iter().map(ForecastPoint::date_label).collect(),
        temperatures: window.iter().map(|p| p.temperature).collect(),
    }
}

/// Entries in order, dropping any city already seen.
fn distinct<T>(cities: &[(String, T)]) -> Vec<&(String, T)> {
    let mut seen = HashSet::new();
    cities.iter().filter(|(city, _)| seen.insert(city.as_str())).collect()
}

/// The first `size` points, or `None` when there are fewer than [`MIN_POINTS`].
fn window(forecast: &[ForecastPoint], size: usize) -> Option<&[ForecastPoint]> {
    (forecast.len() >= MIN_POINTS).then(|| &forecast[..forecast.len().min(size)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::tests::{forecast, weather};

    fn pair(city: &str, points: usize) -> (String, Vec<ForecastPoint>) {
        (city.to_owned(), forecast(points))
    }

    #[test]
    fn single_city_charts_skip_short_forecasts() {
        for len in 0..MIN_POINTS {
            let points = forecast(len);
            assert!(ChartSpec::temperature_trend(&points, "Oslo").is_none());
            assert!(ChartSpec::humidity(&points, "Oslo").is_none());
            assert!(ChartSpec::hourly(&points, "Oslo").is_none());
        }
        assert!(ChartSpec::temperature_trend(&forecast(2), "Oslo").is_some());
    }

    #[test]
    fn trend_uses_first_seven_points_only() {
        let points = forecast(40);
        let spec = ChartSpec::temperature_trend(&points, "Oslo").unwrap();

        let expected: Vec<f64> = points[..7].iter().map(|p| p.temperature).collect();
        assert_eq!(spec.series[0].values, expected);
        assert_eq!(spec.categories.len(), 7);
        assert!(!spec.series[0].values.contains(&points[7].temperature));
    }

    #[test]
    fn trend_labels_by_day() {
        let spec = ChartSpec::temperature_trend(&forecast(8), "Oslo").unwrap();
        // 7 slots from midnight span 18 hours of the same day.
        assert!(spec.categories.iter().all(|l| l == "03/01"));
    }

    #[test]
    fn humidity_has_fixed_scale_and_percent_labels() {
        let points = forecast(10);
        let spec = ChartSpec::humidity(&points, "Oslo").unwrap();

        assert_eq!(spec.y_range, Some((0.0, 100.0)));
        assert_eq!(spec.value_range(), (0.0, 100.0));
        assert_eq!(spec.series[0].style, SeriesStyle::Bars);
        assert_eq!(spec.series[0].values.len(), 7);
        assert_eq!(spec.series[0].value_labels[0], "40%");
        assert_eq!(spec.series[0].value_labels[6], "70%");
    }

    #[test]
    fn hourly_uses_eight_points_with_time_labels() {
        let spec = ChartSpec::hourly(&forecast(40), "Oslo").unwrap();

        assert_eq!(spec.series[0].values.len(), HOURLY_WINDOW);
        assert_eq!(spec.categories[0], "00:00");
        assert_eq!(spec.categories[7], "21:00");
        assert_eq!(spec.series[0].style, SeriesStyle::FilledArea);
    }

    #[test]
    fn short_forecast_uses_what_is_there() {
        let spec = ChartSpec::hourly(&forecast(3), "Oslo").unwrap();
        assert_eq!(spec.series[0].values, vec![10.0, 11.0, 12.0]);
    }

    #[test]
    fn file_names_follow_kind_and_city() {
        assert_eq!(ChartKind::TemperatureTrend.file_name("New York"), "temp_trend_New_York.png");
        assert_eq!(ChartKind::Humidity.file_name("Paris"), "humidity_Paris.png");
        assert_eq!(ChartKind::Hourly.file_name("San Jose"), "hourly_San_Jose.png");
        assert_eq!(ChartKind::MultiCityComparison.file_name("x"), "multi_city_comparison.png");
        assert_eq!(ChartKind::WindSpeed.file_name("x"), "wind_speed_comparison.png");
    }

    #[test]
    fn file_names_cannot_escape_directory() {
        let name = ChartKind::Hourly.file_name("../../etc/passwd");
        assert!(!name.contains('/'));
        assert!(!name.contains(".."));
    }

    #[test]
    fn comparison_needs_two_cities() {
        assert!(ChartSpec::comparison(&[]).is_none());
        assert!(ChartSpec::comparison(&[pair("Oslo", 10)]).is_none());
        assert!(ChartSpec::hourly_comparison(&[pair("Oslo", 10)]).is_none());
    }

    #[test]
    fn comparison_draws_one_series_per_city() {
        let spec = ChartSpec::comparison(&[pair("Oslo", 10), pair("Rome", 10)]).unwrap();

        assert_eq!(spec.series.len(), 2);
        assert_eq!(spec.series[0].label.as_deref(), Some("Oslo"));
        assert_eq!(spec.series[1].label.as_deref(), Some("Rome"));
        assert_ne!(spec.series[0].color, spec.series[1].color);
        assert_eq!(spec.series[0].values.len(), DAILY_WINDOW);
        assert_eq!(spec.file_name, "multi_city_comparison.png");
    }

    #[test]
    fn comparison_palette_cycles() {
        let cities: Vec<_> = (0..7).map(|i| pair(&format!("C{i}"), 3)).collect();
        let spec = ChartSpec::comparison(&cities).unwrap();

        assert_eq!(spec.series[5].color, PALETTE[0]);
        assert_eq!(spec.series[6].color, PALETTE[1]);
    }

    #[test]
    fn comparison_skips_empty_forecasts_but_keeps_colours() {
        let spec = ChartSpec::comparison(&[pair("Oslo", 0), pair("Rome", 4), pair("Nice", 9)])
            .unwrap();

        assert_eq!(spec.series.len(), 2);
        assert_eq!(spec.series[0].color, PALETTE[1]);
        assert_eq!(spec.categories.len(), DAILY_WINDOW);

        assert!(ChartSpec::comparison(&[pair("Oslo", 0), pair("Rome", 0)]).is_none());
    }

    #[test]
    fn comparison_skips_single_point_forecasts() {
        assert!(ChartSpec::comparison(&[pair("Oslo", 1), pair("Rome", 1)]).is_none());
        assert!(ChartSpec::hourly_comparison(&[pair("Oslo", 1), pair("Rome", 1)]).is_none());

        let spec = ChartSpec::comparison(&[pair("Oslo", 1), pair("Rome", 3)]).unwrap();
        assert_eq!(spec.series.len(), 1);
        assert_eq!(spec.series[0].label.as_deref(), Some("Rome"));
        assert_eq!(spec.series[0].color, PALETTE[1]);
    }

    #[test]
    fn repeated_city_counts_once() {
        assert!(ChartSpec::comparison(&[pair("Oslo", 8), pair("Oslo", 8)]).is_none());
        assert!(ChartSpec::hourly_comparison(&[pair("Oslo", 8), pair("Oslo", 8)]).is_none());

        let spec =
            ChartSpec::comparison(&[pair("Oslo", 8), pair("Rome", 8), pair("Oslo", 3)]).unwrap();
        let labels: Vec<_> = spec.series.iter().filter_map(|s| s.label.as_deref()).collect();
        assert_eq!(labels, vec!["Oslo", "Rome"]);
        assert_eq!(spec.series[0].values.len(), DAILY_WINDOW);

        let winds = vec![
            ("Oslo".to_string(), weather("Oslo", 3.0, 4.0)),
            ("Oslo".to_string(), weather("Oslo", 3.0, 9.0)),
        ];
        assert!(ChartSpec::wind_speed(&winds).is_none());
    }

    #[test]
    fn hourly_comparison_uses_time_window() {
        let spec = ChartSpec::hourly_comparison(&[pair("Oslo", 12), pair("Rome", 12)]).unwrap();

        assert_eq!(spec.series[0].values.len(), HOURLY_WINDOW);
        assert_eq!(spec.categories[1], "03:00");
        assert_eq!(spec.file_name, "hourly_comparison.png");
    }

    #[test]
    fn wind_speed_labels_one_decimal() {
        let cities = vec![
            ("Oslo".to_string(), weather("Oslo", 3.0, 4.26)),
            ("Rome".to_string(), weather("Rome", 20.0, 1.0)),
        ];
        let spec = ChartSpec::wind_speed(&cities).unwrap();

        assert_eq!(spec.categories, vec!["Oslo", "Rome"]);
        assert_eq!(spec.series[0].values, vec![4.26, 1.0]);
        assert_eq!(spec.series[0].value_labels, vec!["4.3 m/s", "1.0 m/s"]);

        assert!(ChartSpec::wind_speed(&cities[..1]).is_none());
    }

    #[test]
    fn bars_are_anchored_at_zero() {
        let cities = vec![
            ("Oslo".to_string(), weather("Oslo", 3.0, 4.0)),
            ("Rome".to_string(), weather("Rome", 20.0, 6.0)),
        ];
        let (lo, hi) = ChartSpec::wind_speed(&cities).unwrap().value_range();
        assert_eq!(lo, 0.0);
        assert!(hi > 6.0);
    }

    #[test]
    fn line_range_is_padded_around_data() {
        let (lo, hi) = ChartSpec::temperature_trend(&forecast(7), "Oslo").unwrap().value_range();
        assert!(lo < 10.0);
        assert!(hi > 16.0);
    }

    #[test]
    fn trend_data_matches_window() {
        let data = trend_data("Oslo", &forecast(12));
        assert_eq!(data.city, "Oslo");
        assert_eq!(data.labels.len(), DAILY_WINDOW);
        assert_eq!(data.temperatures[6], 16.0);

        assert!(trend_data("Oslo", &[]).labels.is_empty());
    }
}
