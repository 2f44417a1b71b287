use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::application::ports::{
    ConversationScope, ConversationStore, CustomerProfile, StoreError,
};
use crate::domain::{
    Channel, Conversation, ConversationId, ConversationStatus, Message, SentimentSummary,
};

/// In-memory store used by tests and local development. Enforces the same
/// one-active-conversation-per-tuple constraint as the Postgres adapter.
#[derive(Default)]
pub struct InMemoryConversationStore {
    conversations: RwLock<HashMap<ConversationId, Conversation>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn find_active_by_tuple(
        &self,
        owner_id: &str,
        channel: Channel,
        customer_id: &str,
    ) -> Result<Option<Conversation>, StoreError> {
        let conversations = self.conversations.read().await;
        let found = conversations
            .values()
            .filter(|c| {
                c.status == ConversationStatus::Active
                    && c.owner_id == owner_id
                    && c.channel == channel
                    && c.customer_id == customer_id
            })
            .max_by_key(|c| c.start_time)
            .cloned();
        Ok(found)
    }

    async fn create_conversation(&self, conversation: &Conversation) -> Result<(), StoreError> {
        let mut conversations = self.conversations.write().await;

        if conversation.status == ConversationStatus::Active {
            let duplicate = conversations.values().any(|c| {
                c.status == ConversationStatus::Active
                    && c.owner_id == conversation.owner_id
                    && c.channel == conversation.channel
                    && c.customer_id == conversation.customer_id
            });
            if duplicate {
                return Err(StoreError::ConstraintViolation(format!(
                    "active conversation already exists for ({}, {}, {})",
                    conversation.owner_id, conversation.channel, conversation.customer_id
                )));
            }
        }

        conversations.insert(conversation.id, conversation.clone());
        Ok(())
    }

    async fn append_message_and_update(
        &self,
        id: ConversationId,
        message: &Message,
        summary: &SentimentSummary,
        end_time: DateTime<Utc>,
        profile: &CustomerProfile,
    ) -> Result<(), StoreError> {
        let mut conversations = self.conversations.write().await;
        let conversation = conversations
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("conversation {}", id)))?;

        if !conversation.contains_message(&message.id) {
            conversation.messages.push(message.clone());
        }
        conversation.summary = *summary;
        conversation.end_time = end_time;
        if conversation.customer_name.is_none() {
            conversation.customer_name = profile.name.clone();
        }
        if conversation.customer_phone.is_none() {
            conversation.customer_phone = profile.phone.clone();
        }
        Ok(())
    }

    async fn query_by_scope_and_time_range(
        &self,
        scope: &ConversationScope,
        since: DateTime<Utc>,
    ) -> Result<Vec<Conversation>, StoreError> {
        let conversations = self.conversations.read().await;
        let mut matched: Vec<Conversation> = conversations
            .values()
            .filter(|c| c.start_time >= since)
            .filter(|c| {
                scope
                    .owner_id
                    .as_ref()
                    .map_or(true, |owner| &c.owner_id == owner)
            })
            .filter(|c| scope.channel.map_or(true, |channel| c.channel == channel))
            .cloned()
            .collect();
        matched.sort_by_key(|c| c.start_time);
        Ok(matched)
    }

    async fn set_status(
        &self,
        id: ConversationId,
        status: ConversationStatus,
    ) -> Result<(), StoreError> {
        let mut conversations = self.conversations.write().await;
        let conversation = conversations
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("conversation {}", id)))?;
        conversation.status = status;
        Ok(())
    }

    async fn set_handled(
        &self,
        id: ConversationId,
        handled: bool,
        by: Option<&str>,
        at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        let mut conversations = self.conversations.write().await;
        let conversation = conversations
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("conversation {}", id)))?;
        conversation.handled = handled;
        conversation.handled_by = by.map(str::to_string);
        conversation.handled_at = at;
        Ok(())
    }
}
