use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of current conditions for one city, as returned by the provider.
///
/// `feels_like`, `wind_speed` and `pressure` are only filled when the provider sends them;
/// the chat path forwards them to the model, the MCP path drops them via [`WeatherSummary`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub city: String,
    /// ISO 3166 country code.
    pub country: String,
    /// Degrees Celsius.
    pub temperature: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feels_like: Option<f64>,
    pub description: String,
    /// Relative humidity, percent.
    pub humidity: u8,
    /// Metres per second.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f64>,
    /// hPa.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_at: Option<DateTime<Utc>>,
}

/// Reduced reading exposed to MCP hosts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSummary {
    pub city: String,
    pub country: String,
    pub temperature: f64,
    pub description: String,
    pub humidity: u8,
}

impl From<&WeatherReading> for WeatherSummary {
    fn from(reading: &WeatherReading) -> Self {
        Self {
            city: reading.city.clone(),
            country: reading.country.clone(),
            temperature: reading.temperature,
            description: reading.description.clone(),
            humidity: reading.humidity,
        }
    }
}
