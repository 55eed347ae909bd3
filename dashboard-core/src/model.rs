use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Unit system requested from the weather API.
///
/// `Standard` is the API default (Kelvin) and is converted locally;
/// `Metric` asks the API for Celsius directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Standard,
    Metric,
}

impl Units {
    /// Value of the `units` query parameter, if one is sent at all.
    pub fn query_value(&self) -> Option<&'static str> {
        match self {
            Units::Standard => None,
            Units::Metric => Some("metric"),
        }
    }
}

/// Current conditions for one city, temperatures in °C.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub city: String,
    pub country: Option<String>,
    pub temperature: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    /// Relative humidity, 0..=100.
    pub humidity: u8,
    /// hPa
    pub pressure: i64,
    pub description: String,
    /// Metres per second, as reported.
    pub wind_speed: f64,
    pub icon: String,
}

/// One 3-hour slot of a forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Start of the slot, carrying the city's UTC offset.
    pub timestamp: DateTime<FixedOffset>,
    pub temperature: f64,
    pub humidity: u8,
    pub description: String,
    pub icon: String,
}

impl ForecastPoint {
    /// Axis label by day, e.g. `10/19`.
    pub fn date_label(&self) -> String {
        self.timestamp.format("%m/%d").to_string()
    }

    /// Axis label by time of day, e.g. `15:00`.
    pub fn time_label(&self) -> String {
        self.timestamp.format("%H:%M").to_string()
    }
}

/// Successful half of a search payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub city: String,
    pub temperature: f64,
    pub humidity: u8,
    pub description: String,
    pub icon: String,
}

/// JSON payload returned by the interactive city search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    #[serde(flatten)]
    pub hit: Option<SearchHit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchResponse {
    pub fn found(hit: SearchHit) -> Self {
        Self { success: true, hit: Some(hit), error: None }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self { success: false, hit: None, error: Some(message.into()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn labels_use_the_points_own_offset() {
        let offset = FixedOffset::east_opt(3600).unwrap();
        let point = ForecastPoint {
            timestamp: offset.with_ymd_and_hms(2024, 12, 31, 23, 30, 0).unwrap(),
            temperature: 1.0,
            humidity: 50,
            description: String::new(),
            icon: String::new(),
        };
        assert_eq!(point.date_label(), "12/31");
        assert_eq!(point.time_label(), "23:30");
    }

    #[test]
    fn failure_payload_shape() {
        let json = serde_json::to_value(SearchResponse::failure("Invalid API key")).unwrap();
        assert_eq!(json, serde_json::json!({ "success": false, "error": "Invalid API key" }));
    }

    #[test]
    fn found_payload_is_flat() {
        let json = serde_json::to_value(SearchResponse::found(SearchHit {
            city: "Paris".into(),
            temperature: 18.5,
            humidity: 60,
            description: "Clear Sky".into(),
            icon: "01d".into(),
        }))
        .unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["city"], "Paris");
        assert_eq!(json["temperature"], 18.5);
        assert!(json.get("error").is_none());
    }
}
