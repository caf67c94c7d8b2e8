use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::FetchError;

/// Outcome of one location lookup.
///
/// When `error` is set the numeric fields are zero placeholders and `country`
/// is empty; they are never real measurements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub location: String,
    pub temperature: f64,
    pub description: String,
    pub humidity: u8,
    pub pressure: f64,
    pub wind_speed: f64,
    pub country: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WeatherRecord {
    /// Terminal record for a failed lookup, echoing the requested location.
    pub fn failed(location: impl Into<String>, err: &FetchError) -> Self {
        Self {
            location: location.into(),
            temperature: 0.0,
            description: err.label().to_string(),
            humidity: 0,
            pressure: 0.0,
            wind_speed: 0.0,
            country: String::new(),
            timestamp: Utc::now(),
            error: Some(err.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Externally visible shape of a record, as served by the front-end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityReport {
    pub city: String,
    pub temperature: f64,
    pub description: String,
    pub humidity: u8,
    pub pressure: f64,
    pub wind_speed: f64,
    pub country: String,
    pub timestamp: DateTime<Utc>,
    /// Only present for failed lookups, so a zero reading can be told apart
    /// from a failure without parsing `description`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<WeatherRecord> for CityReport {
    fn from(r: WeatherRecord) -> Self {
        Self {
            city: r.location,
            temperature: r.temperature,
            description: r.description,
            humidity: r.humidity,
            pressure: r.pressure,
            wind_speed: r.wind_speed,
            country: r.country,
            timestamp: r.timestamp,
            error: r.error,
        }
    }
}

/// Response envelope wrapping a batch result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Envelope {
    Success { data: Vec<CityReport>, records: usize },
    Error { message: String },
}

impl Envelope {
    pub fn success(records: Vec<WeatherRecord>) -> Self {
        let data: Vec<CityReport> = records.into_iter().map(CityReport::from).collect();
        let records = data.len();
        Envelope::Success { data, records }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Envelope::Error { message: message.into() }
    }
}
