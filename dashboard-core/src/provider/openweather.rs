use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::{
    error::FetchError,
    model::{CurrentWeather, ForecastPoint, Units},
    units::{kelvin_to_celsius, round1, title_case},
};

use super::WeatherSource;

/// Five days of 3-hour slots.
pub const MAX_FORECAST_POINTS: usize = 40;

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn with_options(
        api_key: String,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self { api_key, base_url: base_url.trim_end_matches('/').to_owned(), http })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        city: &str,
        units: Units,
    ) -> Result<T, FetchError> {
        let url = format!("{}/{}", self.base_url, endpoint);

        let mut query = vec![("q", city), ("appid", self.api_key.as_str())];
        if let Some(units) = units.query_value() {
            query.push(("units", units));
        }

        debug!(%url, ?units, "requesting OpenWeather");
        let res = self.http.get(&url).query(&query).send().await?;

        let status = res.status();
        let body = res.text().await?;

        check_status(status, &body, city)?;

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherProvider {
    #[instrument(skip(self))]
    async fn current_weather(
        &self,
        city: &str,
        units: Units,
    ) -> Result<CurrentWeather, FetchError> {
        let parsed: OwCurrentResponse = self.get_json("weather", city, units).await?;

        let to_celsius = |t: f64| match units {
            Units::Standard => kelvin_to_celsius(t),
            Units::Metric => round1(t),
        };

        // The metric (search) path passes the description through untouched.
        let (description, icon) = describe(&parsed.weather);
        let description = match units {
            Units::Standard => title_case(&description),
            Units::Metric => description,
        };
        let name = if parsed.name.is_empty() { city.to_owned() } else { parsed.name };

        Ok(CurrentWeather {
            humidity: clamp_humidity(parsed.main.humidity, &name),
            city: name,
            country: parsed.sys.and_then(|s| s.country),
            temperature: to_celsius(parsed.main.temp),
            feels_like: to_celsius(parsed.main.feels_like),
            temp_min: to_celsius(parsed.main.temp_min),
            temp_max: to_celsius(parsed.main.temp_max),
            pressure: parsed.main.pressure,
            description,
            wind_speed: parsed.wind.speed,
            icon,
        })
    }

    #[instrument(skip(self))]
    async fn forecast(&self, city: &str) -> Result<Vec<ForecastPoint>, FetchError> {
        let parsed: OwForecastResponse = self.get_json("forecast", city, Units::Standard).await?;

        let offset = parsed
            .city
            .and_then(|c| c.timezone)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix());

        let points = parsed
            .list
            .into_iter()
            .take(MAX_FORECAST_POINTS)
            .map(|entry| -> Result<ForecastPoint, FetchError> {
                let timestamp = unix_to_instant(entry.dt, offset)?;
                let (description, icon) = describe(&entry.weather);
                Ok(ForecastPoint {
                    timestamp,
                    temperature: kelvin_to_celsius(entry.main.temp),
                    humidity: clamp_humidity(entry.main.humidity, city),
                    description: title_case(&description),
                    icon,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(count = points.len(), "forecast points received");
        Ok(points)
    }
}

/// Map a non-success status onto the shared error taxonomy.
fn check_status(status: StatusCode, body: &str, city: &str) -> Result<(), FetchError> {
    if status.is_success() {
        return Ok(());
    }

    warn!(%status, body = %truncate_body(body), "OpenWeather request failed");

    Err(match status {
        StatusCode::UNAUTHORIZED => FetchError::InvalidApiKey,
        StatusCode::NOT_FOUND => FetchError::CityNotFound(city.to_owned()),
        StatusCode::TOO_MANY_REQUESTS => FetchError::RateLimited,
        _ => FetchError::Api(upstream_message(body)),
    })
}

fn upstream_message(body: &str) -> String {
    serde_json::from_str::<OwError>(body)
        .ok()
        .and_then(|e| e.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| "Unknown error".to_string())
}

/// Humidity outside 0..=100 is clamped rather than rejected.
fn clamp_humidity(raw: i64, city: &str) -> u8 {
    if !(0..=100).contains(&raw) {
        warn!(city, humidity = raw, "humidity out of range, clamping");
    }
    raw.clamp(0, 100) as u8
}

fn describe(weather: &[OwWeather]) -> (String, String) {
    weather
        .first()
        .map(|w| (w.description.clone(), w.icon.clone()))
        .unwrap_or_else(|| ("unknown".to_string(), String::new()))
}

fn unix_to_instant(ts: i64, offset: FixedOffset) -> Result<DateTime<FixedOffset>, FetchError> {
    DateTime::from_timestamp(ts, 0).map(|utc| utc.with_timezone(&offset)).ok_or_else(|| {
        FetchError::Decode(<serde_json::Error as serde::de::Error>::custom(format!(
            "timestamp {ts} out of range"
        )))
    })
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct OwError {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    humidity: i64,
    pressure: i64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    #[serde(default)]
    name: String,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    wind: OwWind,
    sys: Option<OwSys>,
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp: f64,
    humidity: i64,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwForecastMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    /// Shift in seconds from UTC.
    timezone: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: Option<OwCity>,
    list: Vec<OwForecastEntry>,
}
