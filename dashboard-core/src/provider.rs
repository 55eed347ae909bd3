use crate::{
    Config, CurrentWeather, FetchError, ForecastPoint, Units,
    model::{SearchHit, SearchResponse},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Remote source of current conditions and 3-hourly forecasts.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    /// Current conditions for `city`, temperatures normalised to °C.
    async fn current_weather(&self, city: &str, units: Units)
    -> Result<CurrentWeather, FetchError>;

    /// Up to 40 forecast points, oldest first.
    async fn forecast(&self, city: &str) -> Result<Vec<ForecastPoint>, FetchError>;
}

/// Build the OpenWeather client described by `config`.
pub fn source_from_config(config: &Config) -> Result<OpenWeatherProvider, FetchError> {
    let api_key = config.api_key().ok_or(FetchError::MissingApiKey)?;
    OpenWeatherProvider::with_options(api_key, config.base_url(), config.request_timeout())
}

/// Interactive search: metric current weather shaped as a JSON payload.
///
/// Never fails; every problem becomes `{"success": false, "error": ...}`.
pub async fn search_weather(source: &dyn WeatherSource, city: &str) -> SearchResponse {
    let city = city.trim();
    if city.is_empty() {
        return SearchResponse::failure("No city provided");
    }

    match source.current_weather(city, Units::Metric).await {
        Ok(weather) => SearchResponse::found(SearchHit {
            city: city.to_owned(),
            temperature: weather.temperature,
            humidity: weather.humidity,
            description: weather.description,
            icon: weather.icon,
        }),
        Err(err) => {
            tracing::warn!(city, error = %err, "weather search failed");
            SearchResponse::failure(err.to_string())
        }
    }
}
