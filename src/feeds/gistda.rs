use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;

use super::HotspotFeed;
use crate::error::{AlertError, Result};
use crate::models::{FireRegion, HazardKind, Hotspot, RawHotspot};

// ---

/// GISTDA hotspot API, queried per province code and day.
#[derive(Debug, Clone)]
pub struct GistdaHotspotFeed {
    client: Client,
    url: String,
    api_key: String,
}

impl GistdaHotspotFeed {
    pub fn new(client: Client, url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            api_key: api_key.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct HotspotResponse {
    #[serde(default)]
    hotspots: Vec<serde_json::Value>,
}

impl HotspotResponse {
    /// Decode each detection on its own so one odd record cannot discard
    /// the rest of the region's detections.
    fn into_hotspots(self, region: &str) -> Vec<Hotspot> {
        // ---
        let mut hotspots = Vec::with_capacity(self.hotspots.len());
        let mut unattributed = 0;
        for (i, item) in self.hotspots.into_iter().enumerate() {
            match serde_json::from_value::<RawHotspot>(item) {
                Ok(raw) => match raw.to_hotspot() {
                    Some(hotspot) => hotspots.push(hotspot),
                    None => unattributed += 1,
                },
                Err(e) => {
                    tracing::debug!("Failed to parse hotspot {} in {}: {}", i, region, e);
                    unattributed += 1;
                }
            }
        }
        if unattributed > 0 {
            tracing::debug!("Skipped {} hotspots without a district in {}", unattributed, region);
        }
        hotspots
    }
}

#[async_trait]
impl HotspotFeed for GistdaHotspotFeed {
    async fn hotspots(&self, region: &FireRegion, date: NaiveDate) -> Result<Vec<Hotspot>> {
        // ---
        let upstream = |e: reqwest::Error| AlertError::upstream(HazardKind::Fire, e);
        let date = date.format("%Y-%m-%d").to_string();

        tracing::debug!("Fetching hotspots for {} on {} from: {}", region.name, date, self.url);

        let response: HotspotResponse = self
            .client
            .get(&self.url)
            .query(&[
                ("province_code", region.code.as_str()),
                ("date", date.as_str()),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(upstream)?
            .error_for_status()
            .map_err(upstream)?
            .json()
            .await
            .map_err(upstream)?;

        let hotspots = response.into_hotspots(&region.name);
        tracing::info!("Found {} hotspots in {}", hotspots.len(), region.name);
        Ok(hotspots)
    }
}
