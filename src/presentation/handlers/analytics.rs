use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::application::services::{AnalyticsError, AnalyticsQuery, TimeRange};
use crate::domain::Channel;
use crate::presentation::state::AppState;

use super::ErrorResponse;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsParams {
    #[serde(default)]
    pub time_range: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    /// Omitted by elevated callers to aggregate across all owners.
    #[serde(default)]
    pub owner_id: Option<String>,
}

#[tracing::instrument(skip(state, params))]
pub async fn analytics_handler(
    State(state): State<AppState>,
    Query(params): Query<AnalyticsParams>,
) -> impl IntoResponse {
    let time_range = match params.time_range.as_deref().unwrap_or("7d").parse::<TimeRange>() {
        Ok(range) => range,
        Err(e) => {
            return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: e })).into_response();
        }
    };

    let channel = match params.channel.as_deref().map(str::parse::<Channel>) {
        None => None,
        Some(Ok(channel)) => Some(channel),
        Some(Err(e)) => {
            return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: e })).into_response();
        }
    };

    let query = AnalyticsQuery {
        time_range,
        channel,
        owner_id: params.owner_id,
    };

    match state.analytics_service.report(&query).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(AnalyticsError::Store(e)) => {
            tracing::error!(error = %e, "Failed to compute analytics report");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch analytics".to_string(),
                }),
            )
                .into_response()
        }
    }
}
