use crate::{Config, WeatherReading, error::WeatherError, provider::openweather::OpenWeatherProvider};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Source of current weather readings.
///
/// Every call goes to the provider; nothing is cached between calls.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn fetch_weather(&self, city: &str) -> Result<WeatherReading, WeatherError>;
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    if !config.has_weather_api_key() {
        tracing::warn!(
            "No weather API key configured; using the built-in fallback key.\n\
             Hint: set WEATHER_API_KEY or run `weather configure`."
        );
    }

    let provider = OpenWeatherProvider::new(config.weather_api_key().to_owned())?
        .with_base_url(&config.weather.base_url);

    Ok(Box::new(provider))
}
