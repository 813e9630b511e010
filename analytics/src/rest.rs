use crate::db;
use crate::directory;
use crate::errors::{Error, ErrorKind};
use crate::failures;
use crate::fleet;
use crate::metrics::{QUERY_FAILURES_TOTAL, QUERY_LATENCY_SECONDS, REQUESTS_TOTAL};
use crate::model::{
    DeviceSummary, ErrorBody, FailureTrendsResponse, FleetStats, OfflineDevicesResponse,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use prometheus::HistogramTimer;
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Source of the current instant for time-windowed queries.
pub type Clock = fn() -> DateTime<Utc>;

#[derive(Debug, Clone)]
pub struct AppState {
    pool: PgPool,
    query_timeout: Duration,
    clock: Clock,
}

impl AppState {
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
            clock: Utc::now,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/devices/stats", get(get_stats))
        .route("/api/devices/list", get(list_devices))
        .route("/api/devices/failures", get(get_failures))
        .route("/api/devices/offline/list", get(list_offline_devices))
        .route("/api/devices/:device_id", get(get_device))
        .route("/health", get(health))
        .with_state(state)
}

fn track(endpoint: &str) -> HistogramTimer {
    REQUESTS_TOTAL.with_label_values(&[endpoint]).inc();
    QUERY_LATENCY_SECONDS
        .with_label_values(&[endpoint])
        .start_timer()
}

async fn get_stats(State(state): State<AppState>) -> Result<Json<FleetStats>, AppError> {
    let _timer = track("stats");

    let stats = db::with_timeout(state.query_timeout, async {
        let mut tx = db::begin_read(&state.pool, state.query_timeout).await?;
        let stats = fleet::fleet_stats(&mut tx).await?;
        tx.commit().await?;
        Ok::<_, Error>(stats)
    })
    .await?;

    debug!("Fleet stats computed over {} devices", stats.total_devices);
    Ok(Json(stats))
}

async fn list_devices(State(state): State<AppState>) -> Result<Json<Vec<DeviceSummary>>, AppError> {
    let _timer = track("list");

    let devices = db::with_timeout(state.query_timeout, async {
        let mut tx = db::begin_read(&state.pool, state.query_timeout).await?;
        let devices = directory::list_devices(&mut tx).await?;
        tx.commit().await?;
        Ok::<_, Error>(devices)
    })
    .await?;

    Ok(Json(devices))
}

async fn get_device(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> Result<Json<DeviceSummary>, AppError> {
    let _timer = track("device");

    let device = db::with_timeout(state.query_timeout, async {
        let mut tx = db::begin_read(&state.pool, state.query_timeout).await?;
        let device = directory::get_device(&mut tx, &device_id).await?;
        tx.commit().await?;
        Ok::<_, Error>(device)
    })
    .await?;

    device
        .map(Json)
        .ok_or_else(|| AppError(Error::NotFound(format!("device {}", device_id))))
}

async fn get_failures(
    State(state): State<AppState>,
) -> Result<Json<FailureTrendsResponse>, AppError> {
    let _timer = track("failures");
    let now = (state.clock)();

    let failure_data = db::with_timeout(state.query_timeout, async {
        let mut tx = db::begin_read(&state.pool, state.query_timeout).await?;
        let buckets = failures::failure_trends(&mut tx, now).await?;
        tx.commit().await?;
        Ok::<_, Error>(buckets)
    })
    .await?;

    Ok(Json(FailureTrendsResponse { failure_data }))
}

#[derive(Debug, Deserialize)]
pub struct OfflineParams {
    pub hours: Option<u32>,
    pub limit: Option<u32>,
}

async fn list_offline_devices(
    State(state): State<AppState>,
    Query(params): Query<OfflineParams>,
) -> Result<Json<OfflineDevicesResponse>, AppError> {
    let _timer = track("offline");
    let now = (state.clock)();
    let (hours, limit) = directory::offline_window(params.hours, params.limit);

    let devices = db::with_timeout(state.query_timeout, async {
        let mut tx = db::begin_read(&state.pool, state.query_timeout).await?;
        let devices = directory::offline_devices(&mut tx, now, hours, limit).await?;
        tx.commit().await?;
        Ok::<_, Error>(devices)
    })
    .await?;

    debug!("{} devices offline for more than {}h", devices.len(), hours);
    Ok(Json(OfflineDevicesResponse { hours, devices }))
}

async fn health(State(state): State<AppState>) -> Response {
    match db::with_timeout(state.query_timeout, db::ping(&state.pool)).await {
        Ok(()) => Json(json!({ "status": "ok" })).into_response(),
        Err(e) => {
            warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorBody {
                    error: ErrorKind::StorageUnavailable.as_str(),
                }),
            )
                .into_response()
        }
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::QueryTimeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub struct AppError(pub Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        match kind {
            ErrorKind::NotFound => debug!("API error: {}", self.0),
            _ => error!("API error: {}", self.0),
        }
        QUERY_FAILURES_TOTAL.with_label_values(&[kind.as_str()]).inc();

        (
            status_for(kind),
            Json(ErrorBody {
                error: kind.as_str(),
            }),
        )
            .into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
