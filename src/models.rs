//! Data models for hazard events, per-location assessments and alert decisions.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---

/// Hazard family an alert belongs to. Alert history is partitioned by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HazardKind {
    Seismic,
    Flood,
    Fire,
}

impl HazardKind {
    // ---
    pub const ALL: [HazardKind; 3] = [HazardKind::Seismic, HazardKind::Flood, HazardKind::Fire];

    pub fn as_str(&self) -> &'static str {
        // ---
        match self {
            HazardKind::Seismic => "seismic",
            HazardKind::Flood => "flood",
            HazardKind::Fire => "fire",
        }
    }

    /// Parse the lowercase kind name used in routes and the history table.
    pub fn parse(value: &str) -> Option<Self> {
        // ---
        HazardKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for HazardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fixed point of interest that alerts are evaluated against.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitoredLocation {
    // ---
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl MonitoredLocation {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }
}

/// Province-level region polled by the hotspot feed.
#[derive(Debug, Clone, PartialEq)]
pub struct FireRegion {
    // ---
    pub code: String,
    pub name: String,
}

/// A seismic event as delivered by the upstream catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HazardEvent {
    // ---
    pub id: String,
    pub magnitude: f64,
    pub epicenter_lat: f64,
    pub epicenter_lon: f64,
    pub depth_km: f64,
    pub occurred_at: DateTime<Utc>,
    pub source_url: String,
    pub place: String,
}

/// Raw GeoJSON feature from the USGS FDSN event service.
#[derive(Debug, Deserialize)]
pub struct RawQuakeFeature {
    // ---
    pub id: String,
    pub properties: RawQuakeProperties,
    pub geometry: RawQuakeGeometry,
}

#[derive(Debug, Deserialize)]
pub struct RawQuakeProperties {
    // ---
    pub mag: Option<f64>,
    pub place: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub time: i64,
    pub url: Option<String>,
}

/// `[longitude, latitude, depth_km]`
#[derive(Debug, Deserialize)]
pub struct RawQuakeGeometry {
    pub coordinates: Vec<f64>,
}

impl RawQuakeFeature {
    // ---
    /// Convert into a [`HazardEvent`]. Features without a magnitude,
    /// coordinates or a representable origin time are unusable and yield `None`.
    pub fn to_event(&self) -> Option<HazardEvent> {
        // ---
        let magnitude = self.properties.mag?;
        let lon = *self.geometry.coordinates.first()?;
        let lat = *self.geometry.coordinates.get(1)?;
        let depth_km = self.geometry.coordinates.get(2).copied().unwrap_or(0.0);
        let occurred_at = DateTime::<Utc>::from_timestamp_millis(self.properties.time)?;

        Some(HazardEvent {
            id: self.id.clone(),
            magnitude,
            epicenter_lat: lat,
            epicenter_lon: lon,
            depth_km,
            occurred_at,
            source_url: self.properties.url.clone().unwrap_or_default(),
            place: self
                .properties
                .place
                .clone()
                .unwrap_or_else(|| "Unknown location".to_string()),
        })
    }
}

/// Expected shaking at a monitored location, ordered from weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Intensity {
    Minor,
    Moderate,
    Severe,
    Extreme,
}

impl Intensity {
    // ---
    pub fn rank(&self) -> u8 {
        // ---
        match self {
            Intensity::Minor => 1,
            Intensity::Moderate => 2,
            Intensity::Severe => 3,
            Intensity::Extreme => 4,
        }
    }

    pub fn label(&self) -> &'static str {
        // ---
        match self {
            Intensity::Minor => "minor",
            Intensity::Moderate => "moderate",
            Intensity::Severe => "severe",
            Intensity::Extreme => "extreme",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        // ---
        match value.trim().to_ascii_lowercase().as_str() {
            "minor" => Some(Intensity::Minor),
            "moderate" => Some(Intensity::Moderate),
            "severe" => Some(Intensity::Severe),
            "extreme" => Some(Intensity::Extreme),
            _ => None,
        }
    }
}

/// Overall severity of an outgoing alert, ordered from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum AlertLevel {
    Info,
    Watch,
    Warning,
    Emergency,
}

impl AlertLevel {
    // ---
    pub fn label(&self) -> &'static str {
        // ---
        match self {
            AlertLevel::Info => "Info",
            AlertLevel::Watch => "Watch",
            AlertLevel::Warning => "Warning",
            AlertLevel::Emergency => "Emergency",
        }
    }

    pub fn emoji(&self) -> &'static str {
        // ---
        match self {
            AlertLevel::Info => "ℹ️",
            AlertLevel::Watch | AlertLevel::Warning => "⚠️",
            AlertLevel::Emergency => "🚨",
        }
    }

    /// One step down; `Info` is the floor.
    pub fn downgraded(self) -> Self {
        // ---
        match self {
            AlertLevel::Emergency => AlertLevel::Warning,
            AlertLevel::Warning => AlertLevel::Watch,
            AlertLevel::Watch | AlertLevel::Info => AlertLevel::Info,
        }
    }
}

/// Wave timing and expected shaking of one event at one monitored location.
///
/// Arrival flags are relative to the instant the assessment was computed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactAssessment {
    // ---
    pub location: String,
    pub distance_km: f64,
    pub primary_wave_eta_secs: i64,
    pub secondary_wave_eta_secs: i64,
    pub surface_wave_eta_secs: i64,
    pub primary_arrival: DateTime<Utc>,
    pub secondary_arrival: DateTime<Utc>,
    pub surface_arrival: DateTime<Utc>,
    pub has_primary_arrived: bool,
    pub has_secondary_arrived: bool,
    pub has_surface_arrived: bool,
    pub expected_intensity: Intensity,
}

/// The outcome of evaluating one seismic event during one cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertDecision {
    // ---
    pub event_key: String,
    pub hazard_kind: HazardKind,
    pub alert_level: AlertLevel,
    pub is_high_priority: bool,
    /// Nearest location first.
    pub assessments: Vec<ImpactAssessment>,
    pub advisory_note: Option<String>,
    pub suppressed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestedLevel {
    Keep,
    Downgrade,
}

/// Confidence assessment returned by an advisory collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvisoryResult {
    // ---
    pub confidence: f64,
    pub should_alert: bool,
    pub suggested_level: SuggestedLevel,
    pub additional_context: Option<String>,
}

/// Advisory input to a decision. Collaborator failures collapse to `Absent`.
#[derive(Debug, Clone, PartialEq)]
pub enum Advisory {
    Absent,
    Present(AdvisoryResult),
}

/// A sent alert as kept by the alert-history store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertRecord {
    // ---
    pub id: Uuid,
    pub hazard_kind: HazardKind,
    pub dedup_key: String,
    pub sent_at: DateTime<Utc>,
    pub payload: serde_json::Value,
}

impl AlertRecord {
    pub fn new(
        hazard_kind: HazardKind,
        dedup_key: impl Into<String>,
        payload: serde_json::Value,
        sent_at: DateTime<Utc>,
    ) -> Self {
        // ---
        Self {
            id: Uuid::new_v4(),
            hazard_kind,
            dedup_key: dedup_key.into(),
            sent_at,
            payload,
        }
    }
}

/// A single thermal hotspot detection attributed to a district.
#[derive(Debug, Clone, PartialEq)]
pub struct Hotspot {
    pub district: String,
}

/// Raw hotspot record from the GISTDA API. Detections outside any named
/// district come back with a null or missing `district_name`.
#[derive(Debug, Deserialize)]
pub struct RawHotspot {
    #[serde(default)]
    pub district_name: Option<String>,
}

impl RawHotspot {
    /// `None` when the detection has no usable district name.
    pub fn to_hotspot(&self) -> Option<Hotspot> {
        // ---
        let district = self.district_name.as_deref()?.trim();
        if district.is_empty() {
            return None;
        }
        Some(Hotspot {
            district: district.to_string(),
        })
    }
}

/// Heavy-rain forecast result for one location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FloodAssessment {
    // ---
    pub location: String,
    pub heavy_rain_hours: usize,
    pub max_rainfall_mm: f64,
}

/// Hotspot cluster result for one district on one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FireAssessment {
    // ---
    pub date: NaiveDate,
    pub region: String,
    pub district: String,
    pub hotspot_count: usize,
    pub affected_area_km2: f64,
}

impl FireAssessment {
    /// Dedup key: one alert per district per calendar day.
    pub fn dedup_key(&self) -> String {
        format!("{}_{}_{}", self.date, self.region, self.district)
    }
}
