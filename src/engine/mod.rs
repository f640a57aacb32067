//! Decision engine gateway.
//!
//! Pure (or collaborator-injected) building blocks for every hazard cycle:
//! relevance filtering, wave timing, severity aggregation, advisory
//! adjustment, deduplication and rendering, plus the two secondary
//! threshold checks. The pipeline wires these together; nothing here
//! performs feed or transport I/O.

pub mod advisory;
pub mod dedup;
pub mod hotspot;
pub mod rainfall;
pub mod relevance;
pub mod render;
pub mod severity;
pub mod wave;

pub use advisory::{apply_advisory, consult, Advisor, DisabledAdvisor, HeuristicAdvisor};
pub use dedup::{is_novel, record_sent};
pub use hotspot::check_hotspots;
pub use rainfall::check_rainfall;
pub use relevance::filter_relevant;
pub use render::{render_fire, render_flood, render_seismic};
pub use severity::decide;
pub use wave::assess_impacts;
