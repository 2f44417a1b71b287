use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{Duration, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::application::ports::{ConversationScope, StoreError};
use crate::application::services::TimeRange;
use crate::domain::{Channel, ConversationId, ConversationStatus};
use crate::presentation::state::AppState;

use super::ErrorResponse;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListConversationsParams {
    #[serde(default)]
    pub time_range: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub owner_id: Option<String>,
}

#[tracing::instrument(skip(state, params))]
pub async fn list_conversations_handler(
    State(state): State<AppState>,
    Query(params): Query<ListConversationsParams>,
) -> impl IntoResponse {
    let time_range = match params
        .time_range
        .as_deref()
        .unwrap_or("30d")
        .parse::<TimeRange>()
    {
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

    let scope = ConversationScope {
        owner_id: params.owner_id,
        channel,
    };
    let since = Utc::now() - Duration::days(time_range.days());

    match state.store.query_by_scope_and_time_range(&scope, since).await {
        Ok(conversations) => (StatusCode::OK, Json(conversations)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to list conversations");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to list conversations".to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[derive(Deserialize)]
pub struct SetStatusRequest {
    pub status: ConversationStatus,
}

#[tracing::instrument(skip(state, request))]
pub async fn set_status_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SetStatusRequest>,
) -> impl IntoResponse {
    let id = ConversationId::from_uuid(id);
    match state.store.set_status(id, request.status).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(StoreError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Conversation {} not found", id),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to update conversation status");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to update status".to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetHandledRequest {
    pub handled: bool,
    #[serde(default)]
    pub by: Option<String>,
}

#[tracing::instrument(skip(state, request))]
pub async fn set_handled_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SetHandledRequest>,
) -> impl IntoResponse {
    let id = ConversationId::from_uuid(id);

    // Unsetting clears the audit fields, matching the original behavior.
    let (by, at) = if request.handled {
        (request.by.as_deref(), Some(Utc::now()))
    } else {
        (None, None)
    };

    match state.store.set_handled(id, request.handled, by, at).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(StoreError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Conversation {} not found", id),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to update handled flag");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to update handled flag".to_string(),
                }),
            )
                .into_response()
        }
    }
}
