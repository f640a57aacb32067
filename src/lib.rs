//! Hazard feed poller and seismic alert decision service.
//!
//! The crate is organized around the Explicit Module Boundary Pattern (EMBP):
//! - `engine` – pure decision logic (relevance, wave timing, severity,
//!   advisory adjustment, deduplication, rendering, secondary thresholds)
//! - `feeds`, `notify`, `history` – collaborator traits and their HTTP /
//!   PostgreSQL / in-memory implementations
//! - `pipeline` – per-kind evaluation cycles wiring the above together
//! - `scheduler`, `routes` – interval loops and the HTTP trigger surface
//! - `config`, `schema` – startup concerns used by `main.rs`

pub mod config;
pub mod engine;
pub mod error;
pub mod feeds;
pub mod geo;
pub mod history;
pub mod models;
pub mod notify;
pub mod pipeline;
pub mod routes;
pub mod scheduler;
pub mod schema;

pub use config::{Config, EngineConfig};
pub use error::AlertError;
pub use models::{
    Advisory, AdvisoryResult, AlertDecision, AlertLevel, AlertRecord, HazardEvent, HazardKind,
    ImpactAssessment, Intensity, MonitoredLocation,
};
pub use pipeline::{Collaborators, CycleReport, Pipeline};
