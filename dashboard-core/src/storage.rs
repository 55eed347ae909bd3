//! Captured readings, appended to a JSON-lines file.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::model::CurrentWeather;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub country: Option<String>,
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.country {
            Some(country) => write!(f, "{}, {}", self.name, country),
            None => f.write_str(&self.name),
        }
    }
}

/// One persisted observation. `captured_at` is set once, on capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReading {
    pub city: City,
    pub temperature: f64,
    pub humidity: u8,
    pub description: String,
    pub icon: String,
    captured_at: DateTime<Utc>,
}

impl StoredReading {
    pub fn capture(weather: &CurrentWeather) -> Self {
        Self {
            city: City { name: weather.city.clone(), country: weather.country.clone() },
            temperature: weather.temperature,
            humidity: weather.humidity,
            description: weather.description.clone(),
            icon: weather.icon.clone(),
            captured_at: Utc::now(),
        }
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }
}

impl fmt::Display for StoredReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}°C", self.city.name, self.temperature)
    }
}

/// Append-only log of readings, one JSON object per line.
#[derive(Debug, Clone)]
pub struct ReadingLog {
    path: PathBuf,
}

impl ReadingLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, reading: &StoredReading) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create readings directory: {}", parent.display())
            })?;
        }

        let mut line = serde_json::to_string(reading).context("Failed to serialize reading")?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open readings file: {}", self.path.display()))?;
        file.write_all(line.as_bytes())
            .with_context(|| format!("Failed to write readings file: {}", self.path.display()))?;

        Ok(())
    }

    /// All readings in capture order; a missing file is an empty log.
    pub fn load(&self) -> Result<Vec<StoredReading>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read readings file: {}", self.path.display()))?;

        contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| {
                serde_json::from_str(line).with_context(|| {
                    format!("Malformed reading on line {} of {}", idx + 1, self.path.display())
                })
            })
            .collect()
    }

    /// Readings for one city, matched case-insensitively.
    pub fn for_city(&self, name: &str) -> Result<Vec<StoredReading>> {
        Ok(self
            .load()?
            .into_iter()
            .filter(|r| r.city.name.eq_ignore_ascii_case(name))
            .collect())
    }
}
