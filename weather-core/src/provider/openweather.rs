use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use crate::{config::DEFAULT_WEATHER_BASE_URL, error::WeatherError, model::WeatherReading};

use super::WeatherProvider;

/// Fixed per-request timeout for the provider.
pub const WEATHER_TIMEOUT: Duration = Duration::from_secs(10);

const CURRENT_WEATHER_PATH: &str = "/data/2.5/weather";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Result<Self, WeatherError> {
        let http = Client::builder().timeout(WEATHER_TIMEOUT).build()?;

        Ok(Self {
            api_key,
            base_url: DEFAULT_WEATHER_BASE_URL.to_string(),
            http,
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn current_url(&self) -> String {
        format!("{}{}", self.base_url, CURRENT_WEATHER_PATH)
    }

    async fn fetch_current(&self, city: &str) -> Result<WeatherReading, WeatherError> {
        tracing::debug!(city, "requesting current weather from OpenWeather");

        let res = self
            .http
            .get(self.current_url())
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        let result = interpret_current(status, &body);
        if let Err(err) = &result {
            tracing::warn!(city, %status, "OpenWeather lookup failed: {err}");
        }
        result
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch_weather(&self, city: &str) -> Result<WeatherReading, WeatherError> {
        self.fetch_current(city).await
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: Option<f64>,
    feels_like: Option<f64>,
    humidity: Option<u8>,
    pressure: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: Option<String>,
    dt: Option<i64>,
    sys: Option<OwSys>,
    main: Option<OwMain>,
    #[serde(default)]
    weather: Vec<OwWeather>,
    wind: Option<OwWind>,
}

#[derive(Debug, Deserialize)]
struct OwErrorBody {
    message: Option<String>,
}

/// Turn a provider status and body into a reading or a typed failure.
pub(crate) fn interpret_current(status: StatusCode, body: &str) -> Result<WeatherReading, WeatherError> {
    if status != StatusCode::OK {
        let message = serde_json::from_str::<OwErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .unwrap_or_else(|| "unknown error".to_string());

        return Err(WeatherError::Provider {
            status_code: status.as_u16(),
            message,
        });
    }

    let parsed: OwCurrentResponse = serde_json::from_str(body)
        .map_err(|e| WeatherError::MalformedResponse(format!("invalid JSON: {e}")))?;

    let main = parsed.main.as_ref();
    let first_weather = parsed.weather.into_iter().next();

    Ok(WeatherReading {
        city: required(parsed.name, "name")?,
        country: required(parsed.sys.and_then(|s| s.country), "sys.country")?,
        temperature: required(main.and_then(|m| m.temp), "main.temp")?,
        feels_like: main.and_then(|m| m.feels_like),
        description: required(
            first_weather.and_then(|w| w.description),
            "weather[0].description",
        )?,
        humidity: required(main.and_then(|m| m.humidity), "main.humidity")?,
        wind_speed: parsed.wind.and_then(|w| w.speed),
        pressure: main.and_then(|m| m.pressure),
        observed_at: parsed.dt.and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
    })
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, WeatherError> {
    value.ok_or_else(|| WeatherError::MalformedResponse(format!("missing field `{field}`")))
}
