//! Hotspot threshold check for fire alerts.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::config::FireConfig;
use crate::models::{FireAssessment, FireRegion, Hotspot};

// ---

/// Group `hotspots` detected in `region` on `date` by district and return an
/// assessment for every district with at least `min_hotspots` detections,
/// ordered by district name.
pub fn check_hotspots(
    region: &FireRegion,
    date: NaiveDate,
    hotspots: &[Hotspot],
    cfg: &FireConfig,
) -> Vec<FireAssessment> {
    // ---
    let mut per_district: BTreeMap<&str, usize> = BTreeMap::new();
    for hotspot in hotspots {
        *per_district.entry(hotspot.district.as_str()).or_default() += 1;
    }

    per_district
        .into_iter()
        .filter(|(_, count)| *count >= cfg.min_hotspots)
        .map(|(district, count)| FireAssessment {
            date,
            region: region.name.clone(),
            district: district.to_string(),
            hotspot_count: count,
            affected_area_km2: count as f64 * cfg.km2_per_hotspot,
        })
        .collect()
}
