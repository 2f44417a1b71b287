use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Channel, Conversation, ConversationId, ConversationStatus, Message, SentimentSummary,
};

/// Filter for analytics and listing queries. `owner_id: None` aggregates
/// across all owners (elevated callers only, enforced upstream).
#[derive(Debug, Clone, Default)]
pub struct ConversationScope {
    pub owner_id: Option<String>,
    pub channel: Option<Channel>,
}

/// Customer display fields carried alongside an append so the backfill
/// commits in the same store operation as the message itself.
/// First write wins; the store must never overwrite an existing value.
#[derive(Debug, Clone, Default)]
pub struct CustomerProfile {
    pub name: Option<String>,
    pub phone: Option<String>,
}

impl CustomerProfile {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.phone.is_none()
    }
}

/// Durable keyed storage for conversations and their messages.
///
/// `create_conversation` must refuse a second `Active` conversation for a
/// (owner, channel, customer) tuple with `ConstraintViolation`; callers rely
/// on that to keep the one-active-conversation invariant across processes.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Most recent active conversation for the tuple, with messages.
    async fn find_active_by_tuple(
        &self,
        owner_id: &str,
        channel: Channel,
        customer_id: &str,
    ) -> Result<Option<Conversation>, StoreError>;

    async fn create_conversation(&self, conversation: &Conversation) -> Result<(), StoreError>;

    /// Append a message and apply the derived summary, `end_time` bump, and
    /// optional profile backfill as one atomic update. Appending a message
    /// id that already exists in the conversation is a no-op for the message
    /// list (the summary and `end_time` writes still apply).
    async fn append_message_and_update(
        &self,
        id: ConversationId,
        message: &Message,
        summary: &SentimentSummary,
        end_time: DateTime<Utc>,
        profile: &CustomerProfile,
    ) -> Result<(), StoreError>;

    /// All conversations in scope with `start_time >= since`, with messages.
    async fn query_by_scope_and_time_range(
        &self,
        scope: &ConversationScope,
        since: DateTime<Utc>,
    ) -> Result<Vec<Conversation>, StoreError>;

    async fn set_status(
        &self,
        id: ConversationId,
        status: ConversationStatus,
    ) -> Result<(), StoreError>;

    async fn set_handled(
        &self,
        id: ConversationId,
        handled: bool,
        by: Option<&str>,
        at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("query failed: {0}")]
    QueryFailed(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
}
