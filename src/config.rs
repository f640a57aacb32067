//! Configuration loader for the `hazardwatch` service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). Detection thresholds, monitored locations and
//! cooldown windows live in [`EngineConfig`] so they can be retuned per region
//! and constructed directly in tests without touching the environment.
use std::env;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Duration, FixedOffset, Offset, Utc};

use crate::models::{AlertLevel, FireRegion, HazardKind, Intensity, MonitoredLocation};

/// Parse an optional environment variable into `$ty` with a default value.
macro_rules! parse_env {
    ($var_name:expr, $ty:ty, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.trim().parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Read an optional, non-empty string environment variable.
macro_rules! optional_env {
    ($var_name:expr) => {
        env::var($var_name).ok().filter(|v| !v.trim().is_empty())
    };
}

// ---

/// Magnitude tier of the relevance filter. `None` means no km cap.
#[derive(Debug, Clone, PartialEq)]
pub struct RelevanceTier {
    pub min_magnitude: f64,
    pub max_distance_km: Option<f64>,
}

/// Row of the intensity table: applies when magnitude ≥ `min_magnitude`
/// and distance < `max_distance_km`.
#[derive(Debug, Clone, PartialEq)]
pub struct IntensityRule {
    pub min_magnitude: f64,
    pub max_distance_km: f64,
    pub intensity: Intensity,
}

/// Row of the alert-level table: applies when magnitude ≥ `min_magnitude`
/// or the worst intensity ≥ `min_intensity`.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelRule {
    pub level: AlertLevel,
    pub min_magnitude: f64,
    pub min_intensity: Intensity,
}

/// Propagation speeds in km/s. Must satisfy `primary > secondary > surface > 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveVelocities {
    pub primary: f64,
    pub secondary: f64,
    pub surface: f64,
}

impl Default for WaveVelocities {
    fn default() -> Self {
        Self {
            primary: 6.5,
            secondary: 3.5,
            surface: 2.5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SeismicConfig {
    // ---
    /// Protected region the relevance filter and rendered distance refer to.
    pub reference: MonitoredLocation,
    pub locations: Vec<MonitoredLocation>,
    pub search_radius_deg: f64,
    pub velocities: WaveVelocities,
    /// Evaluated top to bottom, first match wins.
    pub relevance_tiers: Vec<RelevanceTier>,
    /// Evaluated top to bottom, first match wins; fallback is `Minor`.
    pub intensity_rules: Vec<IntensityRule>,
    /// Evaluated top to bottom, first match wins; fallback is `Info`.
    pub level_rules: Vec<LevelRule>,
    pub high_priority_magnitude: f64,
    pub high_priority_intensity: Intensity,
    /// Events at or above this magnitude get the indoor safety guidance.
    pub strong_guidance_magnitude: f64,
    /// Place-name fragments the heuristic advisor treats as seismically active.
    pub active_regions: Vec<String>,
}

impl Default for SeismicConfig {
    fn default() -> Self {
        // ---
        let bangkok = MonitoredLocation::new("Bangkok", 13.7563, 100.5018);
        Self {
            locations: vec![
                bangkok.clone(),
                MonitoredLocation::new("Chiang Mai", 18.7883, 98.9853),
                MonitoredLocation::new("Chiang Rai", 19.9105, 99.826),
                MonitoredLocation::new("Mae Hong Son", 19.3027, 97.9654),
                MonitoredLocation::new("Tak", 16.8841, 99.1258),
            ],
            reference: bangkok,
            search_radius_deg: 25.0,
            velocities: WaveVelocities::default(),
            relevance_tiers: vec![
                RelevanceTier {
                    min_magnitude: 7.0,
                    max_distance_km: None,
                },
                RelevanceTier {
                    min_magnitude: 5.0,
                    max_distance_km: Some(1000.0),
                },
                RelevanceTier {
                    min_magnitude: 4.0,
                    max_distance_km: Some(500.0),
                },
            ],
            intensity_rules: vec![
                IntensityRule {
                    min_magnitude: 7.0,
                    max_distance_km: 300.0,
                    intensity: Intensity::Extreme,
                },
                IntensityRule {
                    min_magnitude: 6.0,
                    max_distance_km: 300.0,
                    intensity: Intensity::Severe,
                },
                IntensityRule {
                    min_magnitude: 7.0,
                    max_distance_km: 600.0,
                    intensity: Intensity::Severe,
                },
                IntensityRule {
                    min_magnitude: 5.0,
                    max_distance_km: 200.0,
                    intensity: Intensity::Moderate,
                },
                IntensityRule {
                    min_magnitude: 6.0,
                    max_distance_km: 500.0,
                    intensity: Intensity::Moderate,
                },
            ],
            level_rules: vec![
                LevelRule {
                    level: AlertLevel::Emergency,
                    min_magnitude: 7.0,
                    min_intensity: Intensity::Extreme,
                },
                LevelRule {
                    level: AlertLevel::Warning,
                    min_magnitude: 6.0,
                    min_intensity: Intensity::Severe,
                },
                LevelRule {
                    level: AlertLevel::Watch,
                    min_magnitude: 5.0,
                    min_intensity: Intensity::Moderate,
                },
            ],
            high_priority_magnitude: 5.5,
            high_priority_intensity: Intensity::Severe,
            strong_guidance_magnitude: 6.0,
            active_regions: vec![
                "Myanmar".to_string(),
                "Indonesia".to_string(),
                "Philippines".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone)]
pub struct FloodConfig {
    // ---
    pub locations: Vec<MonitoredLocation>,
    /// Number of forecast hours inspected.
    pub horizon_hours: usize,
    pub heavy_hourly_mm: f64,
    pub heavy_hours_required: usize,
    pub extreme_hourly_mm: f64,
}

impl Default for FloodConfig {
    fn default() -> Self {
        Self {
            locations: vec![
                MonitoredLocation::new("Bangkok", 13.7563, 100.5018),
                MonitoredLocation::new("Nonthaburi", 13.8622, 100.5142),
                MonitoredLocation::new("Pathum Thani", 14.0208, 100.5255),
            ],
            horizon_hours: 12,
            heavy_hourly_mm: 10.0,
            heavy_hours_required: 3,
            extreme_hourly_mm: 30.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FireConfig {
    // ---
    pub regions: Vec<FireRegion>,
    pub min_hotspots: usize,
    pub km2_per_hotspot: f64,
}

impl Default for FireConfig {
    fn default() -> Self {
        let region = |code: &str, name: &str| FireRegion {
            code: code.to_string(),
            name: name.to_string(),
        };
        Self {
            regions: vec![
                region("10", "Bangkok"),
                region("12", "Nonthaburi"),
                region("13", "Pathum Thani"),
            ],
            min_hotspots: 3,
            km2_per_hotspot: 0.25,
        }
    }
}

/// Minimum spacing between two alerts with the same (kind, key).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cooldowns {
    pub seismic: Duration,
    pub flood: Duration,
    pub fire: Duration,
}

impl Default for Cooldowns {
    fn default() -> Self {
        Self {
            seismic: Duration::hours(2),
            flood: Duration::hours(24),
            fire: Duration::hours(24),
        }
    }
}

impl Cooldowns {
    pub fn for_kind(&self, kind: HazardKind) -> Duration {
        match kind {
            HazardKind::Seismic => self.seismic,
            HazardKind::Flood => self.flood,
            HazardKind::Fire => self.fire,
        }
    }
}

/// Everything the decision engine needs. Independent of transport and storage.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    // ---
    pub seismic: SeismicConfig,
    pub flood: FloodConfig,
    pub fire: FireConfig,
    pub cooldowns: Cooldowns,
    /// Treat history read failures as "not yet sent" instead of aborting.
    pub history_fail_open: bool,
    /// Offset used for rendered clock times and the fire alert calendar day.
    pub utc_offset: FixedOffset,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seismic: SeismicConfig::default(),
            flood: FloodConfig::default(),
            fire: FireConfig::default(),
            cooldowns: Cooldowns::default(),
            history_fail_open: false,
            utc_offset: FixedOffset::east_opt(7 * 3600).unwrap_or_else(|| Utc.fix()),
        }
    }
}

impl EngineConfig {
    /// Reject configurations the engine cannot evaluate sensibly.
    pub fn validate(&self) -> Result<()> {
        // ---
        let v = &self.seismic.velocities;
        if !(v.primary > v.secondary && v.secondary > v.surface && v.surface > 0.0) {
            bail!(
                "wave velocities must satisfy primary > secondary > surface > 0 (got {}, {}, {})",
                v.primary,
                v.secondary,
                v.surface
            );
        }
        if self.seismic.locations.is_empty() {
            bail!("at least one seismic monitored location is required");
        }
        let tiers = &self.seismic.relevance_tiers;
        if tiers.is_empty() {
            bail!("at least one relevance tier is required");
        }
        // First match wins, so a lower tier listed first would shadow the
        // higher ones.
        if !tiers.windows(2).all(|w| w[0].min_magnitude > w[1].min_magnitude) {
            bail!("relevance tiers must be listed in strictly descending magnitude order");
        }
        if self.flood.locations.is_empty() {
            bail!("at least one flood monitored location is required");
        }
        if self.fire.regions.is_empty() {
            bail!("at least one fire region is required");
        }
        Ok(())
    }
}

/// How advisory confidence is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvisoryMode {
    Off,
    Heuristic,
}

/// Polling intervals in seconds, one per hazard kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intervals {
    pub seismic_secs: u64,
    pub flood_secs: u64,
    pub fire_secs: u64,
}

impl Intervals {
    pub fn for_kind(&self, kind: HazardKind) -> u64 {
        match kind {
            HazardKind::Seismic => self.seismic_secs,
            HazardKind::Flood => self.flood_secs,
            HazardKind::Fire => self.fire_secs,
        }
    }
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// PostgreSQL connection string.
    pub db_url: String,

    /// Maximum number of database connections in the pool.
    pub db_pool_max: u32,

    /// Port the HTTP trigger/health surface binds to.
    pub http_port: u16,

    /// Timeout applied to every outbound HTTP request.
    pub http_timeout_secs: u64,

    pub seismic_feed_url: String,
    pub seismic_min_magnitude: f64,
    pub seismic_lookback_minutes: i64,

    pub rainfall_feed_url: String,
    pub openweather_api_key: Option<String>,

    pub hotspot_feed_url: String,
    pub gistda_api_key: Option<String>,

    pub notify_url: String,
    pub notify_token: Option<String>,
    pub notify_emergency_token: Option<String>,

    pub advisory_mode: AdvisoryMode,
    pub advisory_timeout_secs: u64,

    pub intervals: Intervals,

    pub engine: EngineConfig,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `DATABASE_URL` – PostgreSQL connection string for the alert history
///
/// Optional (abridged):
/// - `DB_POOL_MAX` – max DB connections (default: 5)
/// - `SEISMIC_LOCATIONS` – `name:lat:lon;name:lat:lon…`
/// - `RELEVANCE_TIERS` – `7.0:any,5.0:1000,4.0:500`
/// - `INTENSITY_RULES` – `7.0:300:extreme,6.0:300:severe,…`
/// - `WAVE_VELOCITIES` – `6.5,3.5,2.5`
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let db_url = require_env!("DATABASE_URL");
    let db_pool_max = parse_env!("DB_POOL_MAX", u32, 5);
    let http_port = parse_env!("HTTP_PORT", u16, 8080);
    let http_timeout_secs = parse_env!("HTTP_TIMEOUT_SECS", u64, 15);

    let defaults = EngineConfig::default();
    let mut seismic = defaults.seismic;
    if let Some(raw) = optional_env!("REFERENCE_LOCATION") {
        seismic.reference = parse_location(&raw).context("Invalid REFERENCE_LOCATION")?;
    }
    if let Some(raw) = optional_env!("SEISMIC_LOCATIONS") {
        seismic.locations = parse_locations(&raw).context("Invalid SEISMIC_LOCATIONS")?;
    }
    if let Some(raw) = optional_env!("WAVE_VELOCITIES") {
        seismic.velocities = parse_velocities(&raw).context("Invalid WAVE_VELOCITIES")?;
    }
    if let Some(raw) = optional_env!("RELEVANCE_TIERS") {
        seismic.relevance_tiers = parse_tiers(&raw).context("Invalid RELEVANCE_TIERS")?;
    }
    if let Some(raw) = optional_env!("INTENSITY_RULES") {
        seismic.intensity_rules =
            parse_intensity_rules(&raw).context("Invalid INTENSITY_RULES")?;
    }
    if let Some(raw) = optional_env!("ACTIVE_REGIONS") {
        seismic.active_regions = raw.split(',').map(|s| s.trim().to_string()).collect();
    }
    seismic.search_radius_deg = parse_env!("SEARCH_RADIUS_DEG", f64, seismic.search_radius_deg);
    seismic.high_priority_magnitude =
        parse_env!("HIGH_PRIORITY_MAGNITUDE", f64, seismic.high_priority_magnitude);

    let mut flood = defaults.flood;
    if let Some(raw) = optional_env!("FLOOD_LOCATIONS") {
        flood.locations = parse_locations(&raw).context("Invalid FLOOD_LOCATIONS")?;
    }

    let mut fire = defaults.fire;
    if let Some(raw) = optional_env!("FIRE_REGIONS") {
        fire.regions = parse_fire_regions(&raw).context("Invalid FIRE_REGIONS")?;
    }

    let cooldowns = Cooldowns {
        seismic: Duration::minutes(parse_env!("SEISMIC_COOLDOWN_MINUTES", i64, 120)),
        flood: Duration::minutes(parse_env!("FLOOD_COOLDOWN_MINUTES", i64, 1440)),
        fire: Duration::minutes(parse_env!("FIRE_COOLDOWN_MINUTES", i64, 1440)),
    };

    let offset_hours = parse_env!("UTC_OFFSET_HOURS", i32, 7);
    let utc_offset = FixedOffset::east_opt(offset_hours * 3600)
        .ok_or_else(|| anyhow!("Invalid UTC_OFFSET_HOURS: {}", offset_hours))?;

    let engine = EngineConfig {
        seismic,
        flood,
        fire,
        cooldowns,
        history_fail_open: parse_env!("HISTORY_FAIL_OPEN", bool, false),
        utc_offset,
    };
    engine.validate()?;

    let advisory_mode = match optional_env!("ADVISORY_MODE").as_deref() {
        None | Some("heuristic") => AdvisoryMode::Heuristic,
        Some("off") => AdvisoryMode::Off,
        Some(other) => bail!("Invalid ADVISORY_MODE: {} (expected off|heuristic)", other),
    };

    Ok(Config {
        db_url,
        db_pool_max,
        http_port,
        http_timeout_secs,
        seismic_feed_url: optional_env!("SEISMIC_FEED_URL")
            .unwrap_or_else(|| "https://earthquake.usgs.gov/fdsnws/event/1/query".to_string()),
        seismic_min_magnitude: parse_env!("SEISMIC_MIN_MAGNITUDE", f64, 4.0),
        seismic_lookback_minutes: parse_env!("SEISMIC_LOOKBACK_MINUTES", i64, 15),
        rainfall_feed_url: optional_env!("RAINFALL_FEED_URL")
            .unwrap_or_else(|| "https://api.openweathermap.org/data/2.5/onecall".to_string()),
        openweather_api_key: optional_env!("OPENWEATHER_API_KEY"),
        hotspot_feed_url: optional_env!("HOTSPOT_FEED_URL")
            .unwrap_or_else(|| "https://fire.gistda.or.th/api/hotspot".to_string()),
        gistda_api_key: optional_env!("GISTDA_API_KEY"),
        notify_url: optional_env!("NOTIFY_URL")
            .unwrap_or_else(|| "https://notify-api.line.me/api/notify".to_string()),
        notify_token: optional_env!("NOTIFY_TOKEN"),
        notify_emergency_token: optional_env!("NOTIFY_EMERGENCY_TOKEN"),
        advisory_mode,
        advisory_timeout_secs: parse_env!("ADVISORY_TIMEOUT_SECS", u64, 10),
        intervals: Intervals {
            seismic_secs: parse_env!("SEISMIC_INTERVAL_SECS", u64, 600),
            flood_secs: parse_env!("FLOOD_INTERVAL_SECS", u64, 3 * 3600),
            fire_secs: parse_env!("FIRE_INTERVAL_SECS", u64, 6 * 3600),
        },
        engine,
    })
}

// ---

/// Parse `name:lat:lon`.
pub(crate) fn parse_location(raw: &str) -> Result<MonitoredLocation> {
    // ---
    let parts: Vec<&str> = raw.split(':').map(str::trim).collect();
    let [name, lat, lon] = parts.as_slice() else {
        bail!("expected name:lat:lon, got '{}'", raw);
    };
    if name.is_empty() {
        bail!("location name is empty in '{}'", raw);
    }
    Ok(MonitoredLocation::new(
        *name,
        lat.parse().with_context(|| format!("bad latitude in '{}'", raw))?,
        lon.parse().with_context(|| format!("bad longitude in '{}'", raw))?,
    ))
}

/// Parse `name:lat:lon;name:lat:lon…`.
pub(crate) fn parse_locations(raw: &str) -> Result<Vec<MonitoredLocation>> {
    raw.split(';')
        .filter(|s| !s.trim().is_empty())
        .map(parse_location)
        .collect()
}

/// Parse `code:name;code:name…`.
pub(crate) fn parse_fire_regions(raw: &str) -> Result<Vec<FireRegion>> {
    // ---
    raw.split(';')
        .filter(|s| !s.trim().is_empty())
        .map(|entry| {
            let (code, name) = entry
                .split_once(':')
                .ok_or_else(|| anyhow!("expected code:name, got '{}'", entry))?;
            Ok(FireRegion {
                code: code.trim().to_string(),
                name: name.trim().to_string(),
            })
        })
        .collect()
}

/// Parse `primary,secondary,surface`.
pub(crate) fn parse_velocities(raw: &str) -> Result<WaveVelocities> {
    // ---
    let values = raw
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let [primary, secondary, surface] = values.as_slice() else {
        bail!("expected three velocities, got {}", values.len());
    };
    Ok(WaveVelocities {
        primary: *primary,
        secondary: *secondary,
        surface: *surface,
    })
}

/// Parse `magnitude:km|any,…`. Tiers come back highest magnitude first,
/// whatever order they were written in.
pub(crate) fn parse_tiers(raw: &str) -> Result<Vec<RelevanceTier>> {
    // ---
    let mut tiers = raw
        .split(',')
        .map(|entry| {
            let (mag, cap) = entry
                .split_once(':')
                .ok_or_else(|| anyhow!("expected magnitude:km, got '{}'", entry))?;
            let max_distance_km = match cap.trim() {
                "any" => None,
                km => Some(km.parse()?),
            };
            Ok(RelevanceTier {
                min_magnitude: mag.trim().parse()?,
                max_distance_km,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    tiers.sort_by(|a, b| b.min_magnitude.total_cmp(&a.min_magnitude));
    Ok(tiers)
}

/// Parse `magnitude:km:intensity,…`.
pub(crate) fn parse_intensity_rules(raw: &str) -> Result<Vec<IntensityRule>> {
    // ---
    raw.split(',')
        .map(|entry| {
            let parts: Vec<&str> = entry.split(':').map(str::trim).collect();
            let [mag, km, intensity] = parts.as_slice() else {
                bail!("expected magnitude:km:intensity, got '{}'", entry);
            };
            Ok(IntensityRule {
                min_magnitude: mag.parse()?,
                max_distance_km: km.parse()?,
                intensity: Intensity::parse(intensity)
                    .ok_or_else(|| anyhow!("unknown intensity '{}'", intensity))?,
            })
        })
        .collect()
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks sensitive information like database passwords and never prints
    /// API keys or notification tokens, only whether they are set.
    pub fn log_config(&self) {
        // ---
        // Mask the password in the database URL for security
        let masked_db_url = if let Some(at_pos) = self.db_url.rfind('@') {
            if let Some(colon_pos) = self.db_url[..at_pos].rfind(':') {
                format!(
                    "{}:****{}",
                    &self.db_url[..colon_pos],
                    &self.db_url[at_pos..]
                )
            } else {
                self.db_url.clone()
            }
        } else {
            self.db_url.clone()
        };
        let set = |v: &Option<String>| if v.is_some() { "set" } else { "unset" };
        let seismic = &self.engine.seismic;

        tracing::info!("Configuration loaded:");
        tracing::info!("  DATABASE_URL        : {}", masked_db_url);
        tracing::info!("  DB_POOL_MAX         : {}", self.db_pool_max);
        tracing::info!("  HTTP_PORT           : {}", self.http_port);
        tracing::info!("  SEISMIC_FEED_URL    : {}", self.seismic_feed_url);
        tracing::info!("  RAINFALL_FEED_URL   : {}", self.rainfall_feed_url);
        tracing::info!("  HOTSPOT_FEED_URL    : {}", self.hotspot_feed_url);
        tracing::info!("  NOTIFY_URL          : {}", self.notify_url);
        tracing::info!("  NOTIFY_TOKEN        : {}", set(&self.notify_token));
        tracing::info!("  OPENWEATHER_API_KEY : {}", set(&self.openweather_api_key));
        tracing::info!("  GISTDA_API_KEY      : {}", set(&self.gistda_api_key));
        tracing::info!("  ADVISORY_MODE       : {:?}", self.advisory_mode);
        tracing::info!("  HISTORY_FAIL_OPEN   : {}", self.engine.history_fail_open);
        tracing::info!("  REFERENCE_LOCATION  : {}", seismic.reference.name);
        tracing::info!("  SEISMIC_LOCATIONS   : {}", seismic.locations.len());
        tracing::info!("  SEARCH_RADIUS_DEG   : {}", seismic.search_radius_deg);
        tracing::info!("  WAVE_VELOCITIES     : {:?}", seismic.velocities);
        tracing::info!("  INTERVALS           : {:?}", self.intervals);
    }
}
