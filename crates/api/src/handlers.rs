use axum::{
    extract::State,
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
};
use tracing::{debug, instrument};

use crate::errors::ApiError;
use crate::state::AppState;

pub async fn health_check() -> &'static str {
    "ok"
}

/// Prometheus text exposition of every recorded probe.
#[instrument(skip(state), name = "api_get_metrics")]
pub async fn get_metrics(State(state): State<AppState>) -> Result<Response, ApiError> {
    let body = state.metrics.export()?;
    debug!(bytes = body.len(), "Serving metrics scrape");

    Ok(([(CONTENT_TYPE, state.metrics.content_type())], body).into_response())
}
