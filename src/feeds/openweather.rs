use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::RainfallFeed;
use crate::error::{AlertError, Result};
use crate::models::{HazardKind, MonitoredLocation};

// ---

/// OpenWeather One Call hourly forecast.
#[derive(Debug, Clone)]
pub struct OpenWeatherRainfallFeed {
    client: Client,
    url: String,
    api_key: String,
}

impl OpenWeatherRainfallFeed {
    pub fn new(client: Client, url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            api_key: api_key.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OneCallResponse {
    hourly: Vec<HourlyForecast>,
}

#[derive(Debug, Deserialize)]
struct HourlyForecast {
    #[serde(default)]
    rain: Option<Precipitation>,
}

#[derive(Debug, Deserialize)]
struct Precipitation {
    #[serde(rename = "1h", default)]
    one_hour: Option<f64>,
}

#[async_trait]
impl RainfallFeed for OpenWeatherRainfallFeed {
    async fn hourly_rainfall(&self, location: &MonitoredLocation) -> Result<Vec<Option<f64>>> {
        // ---
        let upstream = |e: reqwest::Error| AlertError::upstream(HazardKind::Flood, e);
        let lat = location.latitude.to_string();
        let lon = location.longitude.to_string();

        tracing::debug!("Fetching hourly forecast for {} from: {}", location.name, self.url);

        let response: OneCallResponse = self
            .client
            .get(&self.url)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("exclude", "current,minutely,daily"),
                ("appid", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(upstream)?
            .error_for_status()
            .map_err(upstream)?
            .json()
            .await
            .map_err(upstream)?;

        Ok(response
            .hourly
            .into_iter()
            .map(|hour| hour.rain.and_then(|r| r.one_hour))
            .collect())
    }
}
