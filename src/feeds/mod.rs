//! Upstream hazard feeds.
//!
//! Each feed is a trait so cycles can run against the public HTTP services
//! in production and against canned data in tests. HTTP implementations
//! live in sibling modules (EMBP: this file is the only public gateway).

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::Result;
use crate::models::{FireRegion, HazardEvent, Hotspot, MonitoredLocation};

mod gistda;
mod openweather;
mod usgs;

pub use gistda::GistdaHotspotFeed;
pub use openweather::OpenWeatherRainfallFeed;
pub use usgs::UsgsSeismicFeed;

// ---

/// Worldwide seismic event catalog.
#[async_trait]
pub trait SeismicFeed: Send + Sync {
    /// Events that occurred in `[start, end]`.
    async fn fetch_events(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<HazardEvent>>;
}

/// Hourly precipitation forecast.
#[async_trait]
pub trait RainfallFeed: Send + Sync {
    /// 1-hour precipitation in mm per forecast hour, nearest hour first.
    async fn hourly_rainfall(&self, location: &MonitoredLocation) -> Result<Vec<Option<f64>>>;
}

/// Thermal hotspot detections.
#[async_trait]
pub trait HotspotFeed: Send + Sync {
    async fn hotspots(&self, region: &FireRegion, date: NaiveDate) -> Result<Vec<Hotspot>>;
}
