//! ==============================================================================
//! main.rs - sitemon entry point
//! ==============================================================================
//!
//! purpose:
//!     serves a remote-site monitoring dashboard from a csv sensor feed.
//!     the feed is read behind a ttl snapshot cache; the browser page
//!     redraws itself on a fixed timer from the json widget model.
//!
//! responsibilities:
//!     - load configuration (sitemon.toml + env overrides)
//!     - build the shared state (snapshot source, session controls, backend)
//!     - serve the web dashboard and json api
//!     - run the periodic feed refresh task
//!
//! architecture:
//!
//!     ┌──────────────────────────────────────────────────────────┐
//!     │                     sitemon (this file)                  │
//!     │  ┌──────────────┐   ┌─────────────┐   ┌───────────────┐  │
//!     │  │ refresh task │   │ web server  │   │ control seam  │  │
//!     │  │ (60s cycle)  │   │ (port 3000) │   │ (no-op stub)  │  │
//!     │  └──────┬───────┘   └──────┬──────┘   └───────┬───────┘  │
//!     │         └──────────────────┼──────────────────┘          │
//!     │                   ┌────────┴────────┐                    │
//!     │                   │ SnapshotSource  │ <- source.rs       │
//!     │                   │ (ttl cache)     │                    │
//!     │                   └────────┬────────┘                    │
//!     └────────────────────────────┼─────────────────────────────┘
//!                                  │
//!                            readings.csv
//!
//! the redraw is timer-driven on both sides (tokio interval on the server,
//! setInterval in the page); no render pass ever blocks on a sleep.
//!
//! ==============================================================================

mod actuator;
mod config;
mod dashboard;
mod domain;
mod page;
mod source;

use actuator::{ControlBackend, NoopBackend};
use anyhow::Result;
use axum::{
    extract::State,
    response::{Html, Json},
    routing::{get, post},
    Router,
};
use domain::{ControlState, ControlUpdate};
use source::SnapshotSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::CorsLayer;

// ==============================================================================
// shared state
// ==============================================================================
// shared between the refresh task and the web server:
// - the snapshot source is a single reader behind a mutex (its cache is not
//   thread-safe on its own)
// - the control state is one server-side session object: read every render
//   cycle, written only by POST /api/controls

#[derive(Clone)]
struct AppState {
    source: Arc<Mutex<SnapshotSource>>,
    controls: Arc<RwLock<ControlState>>,
    backend: Arc<dyn ControlBackend>,
    /// page redraw interval (ms), handed to the browser via the model
    refresh_ms: u64,
}

// ==============================================================================
// main entry point
// ==============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    println!("===========================================================");
    println!("  sitemon - Site Monitoring Dashboard");
    println!("===========================================================");

    // step 1: load configuration, then bring up logging at its level
    let config = config::HostConfig::load_or_default();
    init_logging(&config.logging.level);
    config.print_summary();

    // step 2: build shared state
    let ttl = Duration::from_secs(config.source.cache_ttl_seconds);
    let state = AppState {
        source: Arc::new(Mutex::new(SnapshotSource::new(&config.source.data_file, ttl))),
        controls: Arc::new(RwLock::new(ControlState::default())),
        backend: Arc::new(NoopBackend),
        refresh_ms: config.refresh.interval_seconds.max(1) * 1000,
    };

    // step 3: warm the cache so the first page load has data
    {
        let mut source = state.source.lock().await;
        match source.read_latest() {
            Ok(view) => log::info!(
                "[STARTUP] ✓ Initial snapshot loaded (reading at {})",
                view.snapshot.last_reading_time
            ),
            Err(e) => log::warn!("[STARTUP] ⚠ Sensor feed unavailable: {}", e),
        }
    }

    // step 4: start the web server in background
    let web_state = state.clone();
    let bind_addr = config.server.bind_addr.clone();
    tokio::spawn(async move {
        log::info!("[STARTUP] ✓ Dashboard live at http://{}", bind_addr);
        if let Err(e) = run_server(web_state, &bind_addr).await {
            log::error!("[ERROR] Web server error: {}", e);
        }
    });

    // step 5: periodic feed refresh
    let interval = config.refresh.interval_seconds.max(1);
    let show_readings = config.logging.show_readings;
    log::info!("[RUNTIME] Starting feed refresh ({}s interval)", interval);

    let mut ticker = tokio::time::interval(Duration::from_secs(interval));
    loop {
        ticker.tick().await;

        let mut source = state.source.lock().await;
        match source.read_latest() {
            Ok(view) => {
                if show_readings {
                    let s = &view.snapshot;
                    log::info!(
                        "[FEED] {} | Temp: {}°C | Humidity: {}% | Fuel: {}% | Gauge: {}",
                        s.last_reading_time,
                        s.temperature,
                        s.humidity,
                        s.fuel_level,
                        s.gauge_value
                    );
                }
            }
            Err(e) => {
                // no retry; the cache keeps the last-known-good snapshot and
                // the next cycle tries again
                log::warn!("[FEED] ⚠ Read error: {} (serving last known snapshot)", e);
            }
        }
    }
}

/// RUST_LOG wins over the configured level when set
fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}

// ==============================================================================
// web server
// ==============================================================================

async fn run_server(state: AppState, bind_addr: &str) -> Result<()> {
    let app = Router::new()
        .route("/", get(page_handler))
        .route("/api/dashboard", get(dashboard_handler))
        .route("/api/snapshot", get(snapshot_handler))
        .route("/api/controls", post(controls_handler))
        .route("/api/reset", post(reset_handler))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn page_handler() -> Html<&'static str> {
    Html(page::DASHBOARD_HTML)
}

/// one render cycle: latest snapshot (fresh, or retained-stale on failure)
/// plus the session controls, mapped to the widget model
async fn dashboard_handler(State(state): State<AppState>) -> Json<dashboard::DashboardModel> {
    let (view, error) = {
        let mut source = state.source.lock().await;
        match source.read_latest() {
            Ok(view) => (Some(view), None),
            Err(e) => (source.last_known(), Some(e.to_string())),
        }
    };
    let controls = *state.controls.read().await;

    Json(dashboard::build_model(
        view.as_ref(),
        error,
        &controls,
        state.refresh_ms,
        now_ms(),
    ))
}

/// raw state endpoint for programmatic access
async fn snapshot_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let view = state.source.lock().await.last_known();
    let controls = *state.controls.read().await;
    Json(serde_json::json!({ "view": view, "controls": controls }))
}

/// partial control update; out-of-range values are clamped, never rejected.
/// commands are forwarded to the control backend stub and logged there.
async fn controls_handler(
    State(state): State<AppState>,
    Json(update): Json<ControlUpdate>,
) -> Json<ControlState> {
    let applied = {
        let mut controls = state.controls.write().await;
        controls.apply(update);
        *controls
    };

    if let Some(on) = update.pump_on {
        let result = if on && applied.pump_seconds > 0 {
            state.backend.run_pump(applied.pump_seconds)
        } else {
            state.backend.set_pump(on)
        };
        if let Err(e) = result {
            log::warn!("[ACTUATOR] pump command failed: {}", e);
        }
    }
    if let Some(on) = update.generator_on {
        if let Err(e) = state.backend.set_generator(on) {
            log::warn!("[ACTUATOR] generator command failed: {}", e);
        }
    }

    Json(applied)
}

/// the "Reset Slave" button
async fn reset_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    match state.backend.reset_slave() {
        Ok(()) => Json(serde_json::json!({"status": "ok", "action": "reset"})),
        Err(e) => Json(serde_json::json!({"status": "error", "message": e.to_string()})),
    }
}
