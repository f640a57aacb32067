use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;

use super::SeismicFeed;
use crate::error::{AlertError, Result};
use crate::models::{HazardEvent, HazardKind, RawQuakeFeature};

// ---

/// USGS FDSN event service, GeoJSON format.
#[derive(Debug, Clone)]
pub struct UsgsSeismicFeed {
    client: Client,
    url: String,
    min_magnitude: f64,
}

impl UsgsSeismicFeed {
    pub fn new(client: Client, url: impl Into<String>, min_magnitude: f64) -> Self {
        Self {
            client,
            url: url.into(),
            min_magnitude,
        }
    }
}

#[async_trait]
impl SeismicFeed for UsgsSeismicFeed {
    async fn fetch_events(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<HazardEvent>> {
        // ---
        let upstream = |e: reqwest::Error| AlertError::upstream(HazardKind::Seismic, e);
        let starttime = start.to_rfc3339_opts(SecondsFormat::Secs, true);
        let endtime = end.to_rfc3339_opts(SecondsFormat::Secs, true);
        let min_magnitude = self.min_magnitude.to_string();

        tracing::debug!("Fetching seismic events {} .. {} from: {}", starttime, endtime, self.url);

        let response: serde_json::Value = self
            .client
            .get(&self.url)
            .query(&[
                ("format", "geojson"),
                ("starttime", starttime.as_str()),
                ("endtime", endtime.as_str()),
                ("minmagnitude", min_magnitude.as_str()),
                ("orderby", "time"),
            ])
            .send()
            .await
            .map_err(upstream)?
            .error_for_status()
            .map_err(upstream)?
            .json()
            .await
            .map_err(upstream)?;

        let Some(features) = response.get("features").and_then(|f| f.as_array()) else {
            return Err(AlertError::upstream(
                HazardKind::Seismic,
                "response missing 'features' array",
            ));
        };

        let mut events = Vec::with_capacity(features.len());
        for (i, item) in features.iter().enumerate() {
            match serde_json::from_value::<RawQuakeFeature>(item.clone()) {
                Ok(raw) => match raw.to_event() {
                    Some(event) => events.push(event),
                    None => tracing::debug!("Skipping unusable feature {} ({})", i, raw.id),
                },
                Err(e) => {
                    tracing::debug!("Failed to parse feature {}: {} - Raw item: {}", i, e, item);
                }
            }
        }

        tracing::info!("Found {} seismic events worldwide", events.len());
        Ok(events)
    }
}
