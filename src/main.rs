//! Application entry point for the `hazardwatch` service.
//!
//! This binary orchestrates the full startup sequence, including:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Establishing a PostgreSQL connection pool for the alert history
//! - Creating the database schema if it does not exist
//! - Wiring feeds, advisor and notifier into the cycle pipeline
//! - Spawning one polling loop per hazard kind
//! - Binding the Axum HTTP server for health checks and manual triggers
//!
//! # Environment Variables
//! - `DATABASE_URL` (**required**) – PostgreSQL connection string
//! - `HAZARD_LOG_LEVEL` (optional) – log verbosity (default: `debug`)
//! - `HAZARD_SPAN_EVENTS` (optional) – span event mode for tracing
//! - see `config.rs` for feed, notifier and threshold settings
use std::{env, net::SocketAddr, sync::Arc, time::Duration as StdDuration};

use anyhow::{Context, Result};
use axum::Router;
use dotenvy::dotenv;
use is_terminal::IsTerminal;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use hazardwatch::config::{self, AdvisoryMode, Config};
use hazardwatch::engine::{Advisor, DisabledAdvisor, HeuristicAdvisor};
use hazardwatch::feeds::{GistdaHotspotFeed, OpenWeatherRainfallFeed, UsgsSeismicFeed};
use hazardwatch::history::PgAlertHistory;
use hazardwatch::notify::{LineNotifier, LoggingNotifier, Notifier};
use hazardwatch::{routes, scheduler, schema, Collaborators, HazardKind, Pipeline};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    init_tracing();
    dotenv().ok();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    tracing::info!("Attempting to connect to database");

    let pool = PgPoolOptions::new()
        .max_connections(cfg.db_pool_max)
        .connect(&cfg.db_url)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;

    tracing::info!("Successfully connected to database");

    schema::create_schema(&pool).await?;

    let pipeline = Arc::new(build_pipeline(&cfg, pool)?);
    let kinds = scheduled_kinds(&cfg);
    let _schedules = scheduler::spawn_schedules(pipeline.clone(), cfg.intervals, &kinds);

    // Build app from routes gateway (EMBP)
    let app: Router = routes::router(pipeline);

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.http_port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ---

/// Wire the production collaborators described by `cfg`.
fn build_pipeline(cfg: &Config, pool: sqlx::PgPool) -> Result<Pipeline> {
    // ---
    let client = reqwest::Client::builder()
        .timeout(StdDuration::from_secs(cfg.http_timeout_secs))
        .build()
        .context("Failed to build HTTP client")?;

    let notifier: Arc<dyn Notifier> = match &cfg.notify_token {
        Some(token) => Arc::new(LineNotifier::new(
            client.clone(),
            cfg.notify_url.clone(),
            token.clone(),
            cfg.notify_emergency_token.clone(),
        )),
        None => {
            tracing::warn!("NOTIFY_TOKEN not set, alerts will only be logged");
            Arc::new(LoggingNotifier)
        }
    };

    let advisor: Arc<dyn Advisor> = match cfg.advisory_mode {
        AdvisoryMode::Heuristic => Arc::new(HeuristicAdvisor::new(&cfg.engine.seismic)),
        AdvisoryMode::Off => Arc::new(DisabledAdvisor),
    };

    let collab = Collaborators {
        seismic_feed: Arc::new(UsgsSeismicFeed::new(
            client.clone(),
            cfg.seismic_feed_url.clone(),
            cfg.seismic_min_magnitude,
        )),
        rainfall_feed: Arc::new(OpenWeatherRainfallFeed::new(
            client.clone(),
            cfg.rainfall_feed_url.clone(),
            cfg.openweather_api_key.clone().unwrap_or_default(),
        )),
        hotspot_feed: Arc::new(GistdaHotspotFeed::new(
            client,
            cfg.hotspot_feed_url.clone(),
            cfg.gistda_api_key.clone().unwrap_or_default(),
        )),
        advisor,
        notifier,
        history: Arc::new(PgAlertHistory::new(pool)),
    };

    Ok(Pipeline::new(cfg.engine.clone(), collab)
        .with_seismic_lookback(chrono::Duration::minutes(cfg.seismic_lookback_minutes))
        .with_advisory_timeout(StdDuration::from_secs(cfg.advisory_timeout_secs)))
}

/// Kinds whose feed credentials are present. Seismic needs none.
fn scheduled_kinds(cfg: &Config) -> Vec<HazardKind> {
    // ---
    let mut kinds = vec![HazardKind::Seismic];
    match cfg.openweather_api_key {
        Some(_) => kinds.push(HazardKind::Flood),
        None => tracing::warn!("OPENWEATHER_API_KEY not set, flood cycle not scheduled"),
    }
    match cfg.gistda_api_key {
        Some(_) => kinds.push(HazardKind::Fire),
        None => tracing::warn!("GISTDA_API_KEY not set, fire cycle not scheduled"),
    }
    kinds
}

/// Initialize the global tracing subscriber for structured logging.
///
/// This function configures the [`tracing_subscriber`] with:
/// - Log target, file, and line number output enabled
/// - Color output controlled by TTY detection and `FORCE_COLOR` env var:
///   - `FORCE_COLOR=1|true|yes`: force colors on
///   - `FORCE_COLOR=0|false|no`: force colors off
///   - unset or other values: auto-detect TTY
/// - Span event emission mode controlled by the `HAZARD_SPAN_EVENTS` env var:
///   - `"full"`       : emit ENTER, EXIT, and CLOSE events with timing
///   - `"enter_exit"` : emit ENTER and EXIT only
///   - unset or other values: emit CLOSE events only (default)
/// - Log level controlled by the `HAZARD_LOG_LEVEL` env var
///
/// This should be called once at application startup before any logging
/// or tracing macros are invoked. It installs the subscriber globally
/// for the lifetime of the process.
fn init_tracing() {
    // ---
    let span_events = match env::var("HAZARD_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    // Determine if we should use colors
    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    // Use RUST_LOG if available, otherwise fall back to HAZARD_LOG_LEVEL
    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("HAZARD_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "debug",
        };
        EnvFilter::new(format!("{level},sqlx::query=warn,hyper=info,reqwest=info"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
