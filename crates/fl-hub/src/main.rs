use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fl_query::{BucketPolicy, QueryEngine};
use sources::store::RecordStore;
use sources::{JournalSource, LogSource, MockSource, SourceInfo};

mod api;
mod sources;

// =============================================================================
// CLI
// =============================================================================

#[derive(Parser)]
#[command(
    name = "fl-hub",
    version = "0.3.0",
    about = "FAULTLINE error-log query hub"
)]
struct Args {
    /// Server bind address
    #[arg(long, default_value = "127.0.0.1:3000")]
    bind: String,

    /// Path to config file
    #[arg(long, default_value = "faultline.toml")]
    config: PathBuf,

    /// JSON-lines record file. Mock records are served when absent.
    #[arg(long)]
    records: Option<PathBuf>,

    /// Number of mock records (overrides the config file)
    #[arg(long)]
    mock_count: Option<usize>,

    /// Mock generator seed (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,
}

// =============================================================================
// Config
// =============================================================================

#[derive(Deserialize, Default, Clone)]
struct Config {
    #[serde(default)]
    server: ServerConfig,
    #[serde(default)]
    trend: TrendConfig,
    #[serde(default)]
    source: SourceConfig,
}

#[derive(Deserialize, Clone)]
struct ServerConfig {
    /// Page size used when a request carries no pagination.
    #[serde(default = "default_page_size")]
    default_page_size: i64,
    /// Requested page sizes above this are clamped.
    #[serde(default = "default_max_page_size")]
    max_page_size: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

#[derive(Deserialize, Clone)]
struct TrendConfig {
    #[serde(default = "default_day_threshold")]
    day_threshold_hours: i64,
    #[serde(default = "default_half_hour_threshold")]
    half_hour_threshold_hours: i64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            day_threshold_hours: default_day_threshold(),
            half_hour_threshold_hours: default_half_hour_threshold(),
        }
    }
}

#[derive(Deserialize, Clone)]
struct SourceConfig {
    #[serde(default = "default_mock_count")]
    mock_count: usize,
    #[serde(default = "default_mock_span")]
    mock_span_days: i64,
    #[serde(default = "default_seed")]
    seed: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            mock_count: default_mock_count(),
            mock_span_days: default_mock_span(),
            seed: default_seed(),
        }
    }
}

fn default_page_size() -> i64 {
    fl_query::model::DEFAULT_PAGE_SIZE
}
fn default_max_page_size() -> i64 {
    1000
}
fn default_day_threshold() -> i64 {
    48
}
fn default_half_hour_threshold() -> i64 {
    6
}
fn default_mock_count() -> usize {
    5000
}
fn default_mock_span() -> i64 {
    14
}
fn default_seed() -> u64 {
    42
}

impl Config {
    fn bucket_policy(&self) -> Result<BucketPolicy, String> {
        BucketPolicy::from_hours(
            self.trend.day_threshold_hours,
            self.trend.half_hour_threshold_hours,
        )
        .ok_or_else(|| {
            format!(
                "trend thresholds out of range: day_threshold_hours = {}, half_hour_threshold_hours = {}",
                self.trend.day_threshold_hours, self.trend.half_hour_threshold_hours
            )
        })
    }

    fn mock_span(&self) -> Result<Duration, String> {
        let days = self.source.mock_span_days;
        Duration::try_days(days)
            .filter(|span| *span > Duration::zero())
            .ok_or_else(|| format!("source.mock_span_days must be a positive day count, got {}", days))
    }
}

/// A missing file means defaults; an unreadable, malformed or out-of-range
/// one is an error.
fn load_config(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    if !path.exists() {
        tracing::info!("No config at {:?}; using defaults", path);
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.bucket_policy()?;
    config.mock_span()?;
    tracing::info!("Loaded config from {:?}", path);
    Ok(config)
}

// =============================================================================
// Application State
// =============================================================================

struct AppState {
    store: RecordStore,
    engine: QueryEngine,
    config: Config,
    start_time: Instant,
}

impl AppState {
    fn new(source: Arc<dyn LogSource>, config: Config) -> Result<Self, String> {
        let policy = config.bucket_policy()?;
        Ok(Self {
            store: RecordStore::new(source),
            engine: QueryEngine::new(policy),
            config,
            start_time: Instant::now(),
        })
    }
}

// =============================================================================
// Types
// =============================================================================

#[derive(Serialize)]
struct StatusResponse {
    version: &'static str,
    records: usize,
    source: SourceInfo,
    loaded_at: Option<DateTime<Utc>>,
    uptime_seconds: u64,
}

#[derive(Serialize, Deserialize, Debug)]
struct ApiError {
    error: String,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "fl_hub=info,fl_query=info,tower_http=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let mut config = load_config(&args.config)?;
    if let Some(count) = args.mock_count {
        config.source.mock_count = count;
    }
    if let Some(seed) = args.seed {
        config.source.seed = seed;
    }

    let source: Arc<dyn LogSource> = match &args.records {
        Some(path) => Arc::new(JournalSource::new(path.clone())),
        None => Arc::new(MockSource::new(
            config.source.seed,
            config.source.mock_count,
            config.mock_span()?,
        )),
    };

    let state = Arc::new(AppState::new(source, config)?);
    if let Err(e) = state.store.reload().await {
        tracing::error!("Initial load failed: {}. Exiting.", e);
        return Err(e.to_string().into());
    }

    let app = router(state.clone());

    let addr: SocketAddr = args.bind.parse()?;
    let source = state.store.source();
    tracing::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    tracing::info!("  FAULTLINE v0.3.0");
    tracing::info!("  API:        http://{}/api/status", addr);
    tracing::info!("  Source:     {} ({})", source.kind, source.description);
    tracing::info!("  Records:    {}", state.store.snapshot().await.len());
    tracing::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/status", get(api_status))
        .route("/api/fields", get(api::list_fields))
        .route("/api/logs/query", post(api::query_logs))
        .route("/api/logs/groups", post(api::group_logs))
        .route("/api/logs/trend", post(api::trend_logs))
        .route("/api/logs/drill-down", post(api::drill_down))
        .route("/api/logs/export", post(api::export_logs))
        .route("/api/logs/reload", post(api::reload_logs))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// =============================================================================
// Core Handlers
// =============================================================================

async fn api_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION"),
        records: state.store.snapshot().await.len(),
        source: state.store.source(),
        loaded_at: state.store.loaded_at().await,
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_fill_missing_keys() {
        let config: Config = toml::from_str(
            r#"
            [server]
            max_page_size = 200

            [source]
            seed = 7
            "#,
        )
        .unwrap();
        assert_eq!(config.server.default_page_size, 50);
        assert_eq!(config.server.max_page_size, 200);
        assert_eq!(config.trend.day_threshold_hours, 48);
        assert_eq!(config.trend.half_hour_threshold_hours, 6);
        assert_eq!(config.source.seed, 7);
        assert_eq!(config.source.mock_count, 5000);
    }

    #[test]
    fn test_missing_config_file_is_default() {
        let config = load_config(Path::new("/nonexistent/faultline.toml")).unwrap();
        assert_eq!(config.source.mock_span_days, 14);
    }

    #[test]
    fn test_malformed_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("faultline.toml");
        std::fs::write(&path, "[server]\nmax_page_size = \"lots\"\n").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_out_of_range_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("faultline.toml");

        std::fs::write(&path, format!("[source]\nmock_span_days = {}\n", i64::MAX)).unwrap();
        let err = load_config(&path).err().unwrap();
        assert!(err.to_string().contains("mock_span_days"));

        std::fs::write(&path, "[source]\nmock_span_days = 0\n").unwrap();
        assert!(load_config(&path).is_err());

        std::fs::write(&path, format!("[trend]\nday_threshold_hours = {}\n", i64::MAX)).unwrap();
        let err = load_config(&path).err().unwrap();
        assert!(err.to_string().contains("trend thresholds"));

        std::fs::write(&path, "[trend]\nday_threshold_hours = 72\n[source]\nmock_span_days = 30\n").unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.mock_span().unwrap(), Duration::days(30));
        assert_eq!(config.bucket_policy().unwrap().day_threshold, Duration::hours(72));
    }
}
