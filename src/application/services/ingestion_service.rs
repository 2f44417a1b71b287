use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::application::ports::{
    ConversationStore, CustomerProfile, Language, SentimentClassifier, StoreError,
};
use crate::domain::{
    Channel, Conversation, Message, MessageSender, MessageType, Sentiment, SentimentSummary,
};

/// A normalized inbound message event, as produced by the channel adapters.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub owner_id: String,
    pub channel: Channel,
    pub message_id: String,
    pub customer_id: String,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub content: String,
    pub message_type: MessageType,
    pub sender: MessageSender,
    pub timestamp: DateTime<Utc>,
}

type ThreadKey = (String, Channel, String);

/// Coordinates one inbound event end to end: classification, conversation
/// threading, summary recomputation, persistence.
///
/// Safe to call concurrently. The find-or-create-append decision for a
/// (owner, channel, customer) tuple runs under a per-tuple async lock, and
/// the store's refusal to create a second active conversation is handled by
/// re-reading and appending, so concurrent events for one tuple always land
/// in a single active conversation.
pub struct IngestionService {
    classifier: Arc<dyn SentimentClassifier>,
    store: Arc<dyn ConversationStore>,
    language: Language,
    thread_locks: Mutex<HashMap<ThreadKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl IngestionService {
    pub fn new(
        classifier: Arc<dyn SentimentClassifier>,
        store: Arc<dyn ConversationStore>,
        language: Language,
    ) -> Self {
        Self {
            classifier,
            store,
            language,
            thread_locks: Mutex::new(HashMap::new()),
        }
    }

    #[tracing::instrument(
        skip(self, event),
        fields(
            channel = %event.channel,
            customer_id = %event.customer_id,
            message_id = %event.message_id,
        )
    )]
    pub async fn ingest(&self, event: InboundMessage) -> Result<Conversation, IngestError> {
        Self::validate(&event)?;

        let mut message = Message::new(
            event.message_id.clone(),
            event.content.clone(),
            event.sender,
            event.message_type,
            event.timestamp,
        );

        // Classification happens before the threading decision so the lock
        // is never held across the remote call. The gateway resolves every
        // failure to a fallback result, so this cannot fail the ingestion.
        if event.message_type == MessageType::Text && !event.content.trim().is_empty() {
            let classification = self.classifier.classify(&event.content, self.language).await;
            message.sentiment = Some(Sentiment {
                label: classification.label,
                confidence: classification.confidence,
            });
        }

        let lock = self.thread_lock(&event);
        let _guard = lock.lock().await;

        // Two attempts: a create refused by the store's active-tuple
        // constraint means another process won the race, so the re-read
        // must find the active conversation to append to.
        for attempt in 0..2 {
            let existing = self
                .store
                .find_active_by_tuple(&event.owner_id, event.channel, &event.customer_id)
                .await?;

            match existing {
                Some(mut conversation) => {
                    if conversation.contains_message(&message.id) {
                        tracing::debug!(
                            conversation_id = %conversation.id,
                            "Duplicate message id, skipping append"
                        );
                        return Ok(conversation);
                    }

                    conversation.messages.push(message.clone());
                    conversation.end_time = conversation.end_time.max(event.timestamp);
                    if conversation.customer_name.is_none() {
                        conversation.customer_name = event.customer_name.clone();
                    }
                    if conversation.customer_phone.is_none() {
                        conversation.customer_phone = event.customer_phone.clone();
                    }
                    conversation.summary = SentimentSummary::from_messages(&conversation.messages);

                    let profile = CustomerProfile {
                        name: event.customer_name.clone(),
                        phone: event.customer_phone.clone(),
                    };
                    self.store
                        .append_message_and_update(
                            conversation.id,
                            &message,
                            &conversation.summary,
                            conversation.end_time,
                            &profile,
                        )
                        .await?;

                    tracing::info!(
                        conversation_id = %conversation.id,
                        message_count = conversation.messages.len(),
                        "Message appended to conversation"
                    );
                    return Ok(conversation);
                }
                None => {
                    let conversation = Conversation::new(
                        event.owner_id.clone(),
                        event.channel,
                        event.customer_id.clone(),
                        event.customer_name.clone(),
                        event.customer_phone.clone(),
                        message.clone(),
                    );

                    match self.store.create_conversation(&conversation).await {
                        Ok(()) => {
                            tracing::info!(
                                conversation_id = %conversation.id,
                                "Conversation created"
                            );
                            return Ok(conversation);
                        }
                        Err(StoreError::ConstraintViolation(reason)) if attempt == 0 => {
                            tracing::debug!(
                                reason = %reason,
                                "Lost create race, re-reading active conversation"
                            );
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
            }
        }

        Err(IngestError::Store(StoreError::ConstraintViolation(format!(
            "no active conversation for ({}, {}, {}) after losing create race",
            event.owner_id, event.channel, event.customer_id
        ))))
    }

    fn validate(event: &InboundMessage) -> Result<(), IngestError> {
        if event.owner_id.trim().is_empty() {
            return Err(IngestError::InvalidEvent("ownerId is required"));
        }
        if event.message_id.trim().is_empty() {
            return Err(IngestError::InvalidEvent("messageId is required"));
        }
        if event.customer_id.trim().is_empty() {
            return Err(IngestError::InvalidEvent("customerId is required"));
        }
        Ok(())
    }

    fn thread_lock(&self, event: &InboundMessage) -> Arc<tokio::sync::Mutex<()>> {
        let key = (
            event.owner_id.clone(),
            event.channel,
            event.customer_id.clone(),
        );
        let mut locks = self.thread_locks.lock().expect("thread lock map poisoned");
        Arc::clone(locks.entry(key).or_default())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("invalid event: {0}")]
    InvalidEvent(&'static str),
    #[error("store: {0}")]
    Store(#[from] StoreError),
}
