//! Rainfall threshold check for flash-flood alerts.

use crate::config::FloodConfig;
use crate::models::{FloodAssessment, MonitoredLocation};

// ---

/// Inspect the first `horizon_hours` of an hourly forecast for `location`.
///
/// `hourly_mm` holds the 1-hour precipitation per forecast hour; hours
/// without a precipitation figure are `None` and count as dry. Returns an
/// assessment when there are enough heavy-rain hours or a single extreme hour.
pub fn check_rainfall(
    location: &MonitoredLocation,
    hourly_mm: &[Option<f64>],
    cfg: &FloodConfig,
) -> Option<FloodAssessment> {
    // ---
    let window = hourly_mm.iter().take(cfg.horizon_hours).flatten();

    let mut heavy_rain_hours = 0;
    let mut max_rainfall_mm: f64 = 0.0;
    for &mm in window {
        max_rainfall_mm = max_rainfall_mm.max(mm);
        if mm >= cfg.heavy_hourly_mm {
            heavy_rain_hours += 1;
        }
    }

    let triggered =
        heavy_rain_hours >= cfg.heavy_hours_required || max_rainfall_mm >= cfg.extreme_hourly_mm;
    triggered.then(|| FloodAssessment {
        location: location.name.clone(),
        heavy_rain_hours,
        max_rainfall_mm,
    })
}
