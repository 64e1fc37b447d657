use std::future::Future;
use std::sync::{Arc, OnceLock};

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use metrics::gauge;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sarf_core::{Lexicon, LexiconError, LexiconStats};
use sarf_storage::Storage;
use tokio::{
    net::TcpListener,
    sync::{Mutex, MutexGuard},
    task::JoinHandle,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

mod error;
mod morphology;
mod patterns;
mod roots;

pub use error::ApiError;
pub use morphology::{GenerateManyRequest, GenerateRequest, ValidateRequest};
pub use patterns::{PatternRequest, PatternUpdateRequest};
pub use roots::{RootRequest, RootUpdateRequest};

/// Largest accepted request body, uploads included.
pub const DEFAULT_UPLOAD_LIMIT: usize = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub upload_limit: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            upload_limit: DEFAULT_UPLOAD_LIMIT,
        }
    }
}

#[derive(Clone)]
pub(crate) struct AppState {
    lexicon: Arc<Mutex<Lexicon>>,
    storage: Storage,
    metrics: PrometheusHandle,
}

impl AppState {
    /// Every read and write goes through this one lock.
    pub(crate) async fn lexicon(&self) -> MutexGuard<'_, Lexicon> {
        self.lexicon.lock().await
    }

    /// Runs `change` against a copy of the lexicon. When `dirty` says the
    /// outcome changed something, the copy is saved and only then replaces
    /// the live lexicon, so a failed save leaves memory untouched.
    pub(crate) async fn mutate<T>(
        &self,
        change: impl FnOnce(&mut Lexicon) -> Result<T, LexiconError>,
        dirty: impl FnOnce(&T) -> bool,
    ) -> Result<T, ApiError> {
        let mut live = self.lexicon.lock().await;
        let mut staged = live.clone();
        let outcome = change(&mut staged)?;
        if dirty(&outcome) {
            self.storage.save_lexicon(&staged)?;
            record_gauges(&staged);
            *live = staged;
        }
        Ok(outcome)
    }
}

fn record_gauges(lexicon: &Lexicon) {
    let stats = lexicon.stats();
    gauge!("sarf_roots").set(stats.total_roots as f64);
    gauge!("sarf_patterns").set(stats.total_patterns as f64);
}

fn init_metrics_recorder() -> PrometheusHandle {
    static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
    HANDLE
        .get_or_init(|| {
            let recorder = PrometheusBuilder::new().build_recorder();
            let handle = recorder.handle();
            if metrics::set_global_recorder(recorder).is_err() {
                tracing::warn!("a global metrics recorder is already installed");
            }
            handle
        })
        .clone()
}

pub fn build_router(lexicon: Lexicon, storage: Storage) -> Router {
    build_router_with_config(lexicon, storage, ApiConfig::default())
}

pub fn build_router_with_config(lexicon: Lexicon, storage: Storage, config: ApiConfig) -> Router {
    let metrics = init_metrics_recorder();
    record_gauges(&lexicon);
    let state = AppState {
        lexicon: Arc::new(Mutex::new(lexicon)),
        storage,
        metrics,
    };

    let api = Router::new()
        .route("/health", get(health))
        .route("/stats", get(stats))
        .merge(roots::routes())
        .merge(patterns::routes())
        .merge(morphology::routes());

    Router::new()
        .nest("/api", api)
        .route("/metrics", get(render_metrics))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.upload_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(
    listener: TcpListener,
    lexicon: Lexicon,
    storage: Storage,
    config: ApiConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> JoinHandle<Result<(), std::io::Error>> {
    let app = build_router_with_config(lexicon, storage, config);
    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
    })
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let lexicon = state.lexicon().await;
    let stats = lexicon.stats();
    Json(serde_json::json!({
        "status": "healthy",
        "roots": stats.total_roots,
        "patterns": stats.total_patterns,
    }))
}

async fn stats(State(state): State<AppState>) -> Json<LexiconStats> {
    Json(state.lexicon().await.stats())
}

async fn render_metrics(State(state): State<AppState>) -> Response {
    (StatusCode::OK, state.metrics.render()).into_response()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
