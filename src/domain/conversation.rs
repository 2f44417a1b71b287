use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Channel, ConversationId, ConversationStatus, Message, SentimentSummary};

/// An ordered thread of messages for one customer on one channel.
///
/// Messages are kept in arrival order, which is not necessarily timestamp
/// order. At most one conversation per (owner, channel, customer) tuple may
/// be `Active` at a time; the store enforces this.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: ConversationId,
    pub owner_id: String,
    pub channel: Channel,
    pub customer_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    pub messages: Vec<Message>,
    pub summary: SentimentSummary,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: ConversationStatus,
    pub tags: Vec<String>,
    pub handled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handled_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handled_by: Option<String>,
}

impl Conversation {
    /// Seed a new active conversation from its first message.
    pub fn new(
        owner_id: String,
        channel: Channel,
        customer_id: String,
        customer_name: Option<String>,
        customer_phone: Option<String>,
        first_message: Message,
    ) -> Self {
        let timestamp = first_message.timestamp;
        let summary = SentimentSummary::from_messages(std::slice::from_ref(&first_message));
        Self {
            id: ConversationId::new(),
            owner_id,
            channel,
            customer_id,
            customer_name,
            customer_phone,
            messages: vec![first_message],
            summary,
            start_time: timestamp,
            end_time: timestamp,
            status: ConversationStatus::Active,
            tags: Vec::new(),
            handled: false,
            handled_at: None,
            handled_by: None,
        }
    }

    pub fn contains_message(&self, message_id: &str) -> bool {
        self.messages.iter().any(|m| m.id == message_id)
    }
}
