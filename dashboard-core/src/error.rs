//! Error types shared by the fetch and render halves of the pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong talking to the weather API.
///
/// Both the Kelvin and the metric fetch paths report through this one type.
/// Callers that only need success/failure can branch on `is_err()`.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("API key not configured. Run `weather-dashboard configure` or set OPENWEATHER_API_KEY")]
    MissingApiKey,

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("City \"{0}\" not found")]
    CityNotFound(String),

    #[error("Rate limited by the weather API, try again later")]
    RateLimited,

    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Malformed weather API response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FetchError {
    /// Whether repeating the same request later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited | Self::Network(_))
    }
}

/// Failure to produce a chart file.
///
/// Too little data is not an error; renderers return `Ok(None)` for that.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to draw chart: {0}")]
    Draw(String),

    #[error("No usable font for chart text: {0}")]
    FontUnavailable(String),
}

impl RenderError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}
