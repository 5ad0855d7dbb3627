use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use chrono::{DateTime, Utc};
use pearl_core::HeatmapError;
use pearl_core::activity::ActivitySource;
use pearl_core::config::Config;
use pearl_core::datetime::reference_day;
use pearl_core::heatmap::build_heatmap_data;
use pearl_core::html::render_page;
use tokio::task::JoinError;
use tokio::time::timeout;
use tracing::{debug, error};

#[derive(Clone)]
pub struct AppState {
    source: Arc<dyn ActivitySource>,
    config: Arc<Config>,
    clock: fn() -> DateTime<Utc>,
    fetch_timeout: Duration,
}

impl AppState {
    pub fn new(source: Arc<dyn ActivitySource>, config: Config) -> Self {
        Self {
            source,
            fetch_timeout: config.request_timeout,
            config: Arc::new(config),
            clock: Utc::now,
        }
    }

    #[cfg(test)]
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    #[cfg(test)]
    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(heatmap_page))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

#[tracing::instrument(skip_all)]
async fn heatmap_page(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let now = (state.clock)();
    let today = reference_day(now, state.config.timezone);
    debug!(%now, %today, source = %state.source.name(), "rendering heatmap");

    let source = Arc::clone(&state.source);
    let fetch = tokio::task::spawn_blocking(move || source.fetch_activity(now));
    let activity = timeout(state.fetch_timeout, fetch)
        .await
        .map_err(|_| AppError::Timeout(state.fetch_timeout))?
        .map_err(AppError::Join)?
        .map_err(AppError::Fetch)?;

    let data = build_heatmap_data(&activity, today, state.config.heatmap)
        .map_err(AppError::Build)?;

    let page = render_page(&data).map_err(AppError::Build)?;
    Ok(Html(page))
}

/// Request failures. The client only ever sees a generic message; the cause
/// goes to the log.
#[derive(Debug)]
pub enum AppError {
    Fetch(HeatmapError),
    Build(HeatmapError),
    Join(JoinError),
    Timeout(Duration),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = match &self {
            AppError::Fetch(err) => {
                error!(error = %err, "fetching journey counts");
                "failed to load journey data"
            }
            AppError::Join(err) => {
                error!(error = %err, "journey fetch task failed");
                "failed to load journey data"
            }
            AppError::Timeout(limit) => {
                error!(?limit, "journey fetch timed out");
                "failed to load journey data"
            }
            AppError::Build(err) => {
                error!(error = %err, "building heatmap");
                "failed to build heatmap"
            }
        };
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}
