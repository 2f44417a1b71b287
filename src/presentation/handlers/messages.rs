use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::application::services::{InboundMessage, IngestError};
use crate::domain::{Channel, MessageSender, MessageType};
use crate::presentation::state::AppState;

use super::ErrorResponse;

/// Normalized inbound event, as delivered by the channel adapters.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestMessageRequest {
    pub owner_id: String,
    pub channel: Channel,
    pub message_id: String,
    pub customer_id: String,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    pub content: String,
    #[serde(default = "default_message_type")]
    pub message_type: MessageType,
    pub sender: MessageSender,
    pub timestamp: DateTime<Utc>,
}

fn default_message_type() -> MessageType {
    MessageType::Text
}

#[tracing::instrument(skip(state, request))]
pub async fn ingest_message_handler(
    State(state): State<AppState>,
    Json(request): Json<IngestMessageRequest>,
) -> impl IntoResponse {
    let event = InboundMessage {
        owner_id: request.owner_id,
        channel: request.channel,
        message_id: request.message_id,
        customer_id: request.customer_id,
        customer_name: request.customer_name,
        customer_phone: request.customer_phone,
        content: request.content,
        message_type: request.message_type,
        sender: request.sender,
        timestamp: request.timestamp,
    };

    match state.ingestion_service.ingest(event).await {
        Ok(conversation) => (StatusCode::CREATED, Json(conversation)).into_response(),
        Err(IngestError::InvalidEvent(reason)) => {
            tracing::warn!(reason = %reason, "Rejected malformed inbound event");
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: reason.to_string(),
                }),
            )
                .into_response()
        }
        Err(IngestError::Store(e)) => {
            tracing::error!(error = %e, "Failed to persist inbound message");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to persist message: {}", e),
                }),
            )
                .into_response()
        }
    }
}
