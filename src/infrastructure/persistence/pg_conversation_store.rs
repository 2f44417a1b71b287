use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, QueryBuilder, Row};
use tracing::instrument;
use uuid::Uuid;

use crate::application::ports::{
    ConversationScope, ConversationStore, CustomerProfile, StoreError,
};
use crate::domain::{
    Channel, Conversation, ConversationId, ConversationStatus, Message, Sentiment, SentimentLabel,
    SentimentSummary,
};

const CONVERSATION_COLUMNS: &str = "id, owner_id, channel, customer_id, customer_name, \
     customer_phone, summary_positive, summary_negative, summary_neutral, summary_dominant, \
     summary_total_messages, start_time, end_time, status, tags, handled, handled_at, handled_by";

/// Postgres adapter. Messages live in their own table keyed by
/// (conversation_id, message_id); arrival order is the insertion sequence.
/// The one-active-conversation invariant is backed by a partial unique index
/// on the tuple, surfaced to callers as `ConstraintViolation`.
pub struct PgConversationStore {
    pool: PgPool,
}

impl PgConversationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_messages(&self, id: ConversationId) -> Result<Vec<Message>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, content, sender, message_type, sent_at, sentiment_label, \
             sentiment_confidence \
             FROM messages WHERE conversation_id = $1 ORDER BY seq",
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter().map(message_from_row).collect()
    }
}

#[async_trait]
impl ConversationStore for PgConversationStore {
    #[instrument(skip(self))]
    async fn find_active_by_tuple(
        &self,
        owner_id: &str,
        channel: Channel,
        customer_id: &str,
    ) -> Result<Option<Conversation>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations \
             WHERE owner_id = $1 AND channel = $2 AND customer_id = $3 AND status = 'active' \
             ORDER BY start_time DESC LIMIT 1"
        ))
        .bind(owner_id)
        .bind(channel.as_str())
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        match row {
            Some(row) => {
                let mut conversation = conversation_from_row(&row)?;
                conversation.messages = self.load_messages(conversation.id).await?;
                Ok(Some(conversation))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self, conversation), fields(conversation_id = %conversation.id))]
    async fn create_conversation(&self, conversation: &Conversation) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        sqlx::query(
            "INSERT INTO conversations (id, owner_id, channel, customer_id, customer_name, \
             customer_phone, summary_positive, summary_negative, summary_neutral, \
             summary_dominant, summary_total_messages, start_time, end_time, status, tags, \
             handled, handled_at, handled_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
             $17, $18)",
        )
        .bind(conversation.id.as_uuid())
        .bind(&conversation.owner_id)
        .bind(conversation.channel.as_str())
        .bind(&conversation.customer_id)
        .bind(&conversation.customer_name)
        .bind(&conversation.customer_phone)
        .bind(conversation.summary.positive as i32)
        .bind(conversation.summary.negative as i32)
        .bind(conversation.summary.neutral as i32)
        .bind(conversation.summary.dominant.as_str())
        .bind(conversation.summary.total_messages as i32)
        .bind(conversation.start_time)
        .bind(conversation.end_time)
        .bind(conversation.status.as_str())
        .bind(&conversation.tags)
        .bind(conversation.handled)
        .bind(conversation.handled_at)
        .bind(&conversation.handled_by)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        for message in &conversation.messages {
            insert_message(&mut tx, conversation.id, message).await?;
        }

        tx.commit().await.map_err(map_sqlx_error)
    }

    #[instrument(skip(self, message, summary, profile), fields(conversation_id = %id, message_id = %message.id))]
    async fn append_message_and_update(
        &self,
        id: ConversationId,
        message: &Message,
        summary: &SentimentSummary,
        end_time: DateTime<Utc>,
        profile: &CustomerProfile,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        insert_message(&mut tx, id, message).await?;

        let updated = sqlx::query(
            "UPDATE conversations SET \
             summary_positive = $1, summary_negative = $2, summary_neutral = $3, \
             summary_dominant = $4, summary_total_messages = $5, end_time = $6, \
             customer_name = COALESCE(customer_name, $7), \
             customer_phone = COALESCE(customer_phone, $8) \
             WHERE id = $9",
        )
        .bind(summary.positive as i32)
        .bind(summary.negative as i32)
        .bind(summary.neutral as i32)
        .bind(summary.dominant.as_str())
        .bind(summary.total_messages as i32)
        .bind(end_time)
        .bind(&profile.name)
        .bind(&profile.phone)
        .bind(id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("conversation {}", id)));
        }

        tx.commit().await.map_err(map_sqlx_error)
    }

    #[instrument(skip(self, scope))]
    async fn query_by_scope_and_time_range(
        &self,
        scope: &ConversationScope,
        since: DateTime<Utc>,
    ) -> Result<Vec<Conversation>, StoreError> {
        let mut builder = QueryBuilder::new(format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE start_time >= "
        ));
        builder.push_bind(since);
        if let Some(owner_id) = &scope.owner_id {
            builder.push(" AND owner_id = ");
            builder.push_bind(owner_id);
        }
        if let Some(channel) = scope.channel {
            builder.push(" AND channel = ");
            builder.push_bind(channel.as_str());
        }
        builder.push(" ORDER BY start_time");

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let mut conversations: Vec<Conversation> = rows
            .iter()
            .map(conversation_from_row)
            .collect::<Result<_, _>>()?;

        if conversations.is_empty() {
            return Ok(conversations);
        }

        let ids: Vec<Uuid> = conversations.iter().map(|c| c.id.as_uuid()).collect();
        let message_rows = sqlx::query(
            "SELECT conversation_id, id, content, sender, message_type, sent_at, \
             sentiment_label, sentiment_confidence \
             FROM messages WHERE conversation_id = ANY($1) ORDER BY conversation_id, seq",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let mut by_conversation: HashMap<Uuid, Vec<Message>> = HashMap::new();
        for row in &message_rows {
            let conversation_id: Uuid = row.try_get("conversation_id").map_err(map_sqlx_error)?;
            by_conversation
                .entry(conversation_id)
                .or_default()
                .push(message_from_row(row)?);
        }

        for conversation in &mut conversations {
            if let Some(messages) = by_conversation.remove(&conversation.id.as_uuid()) {
                conversation.messages = messages;
            }
        }

        Ok(conversations)
    }

    #[instrument(skip(self), fields(conversation_id = %id))]
    async fn set_status(
        &self,
        id: ConversationId,
        status: ConversationStatus,
    ) -> Result<(), StoreError> {
        let updated = sqlx::query("UPDATE conversations SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("conversation {}", id)));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(conversation_id = %id))]
    async fn set_handled(
        &self,
        id: ConversationId,
        handled: bool,
        by: Option<&str>,
        at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        let updated = sqlx::query(
            "UPDATE conversations SET handled = $1, handled_by = $2, handled_at = $3 \
             WHERE id = $4",
        )
        .bind(handled)
        .bind(by)
        .bind(at)
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("conversation {}", id)));
        }
        Ok(())
    }
}

async fn insert_message(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    conversation_id: ConversationId,
    message: &Message,
) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT INTO messages (conversation_id, id, content, sender, message_type, sent_at, \
         sentiment_label, sentiment_confidence) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         ON CONFLICT (conversation_id, id) DO NOTHING",
    )
    .bind(conversation_id.as_uuid())
    .bind(&message.id)
    .bind(&message.content)
    .bind(message.sender.as_str())
    .bind(message.message_type.as_str())
    .bind(message.timestamp)
    .bind(message.sentiment.map(|s| s.label.as_str()))
    .bind(message.sentiment.map(|s| s.confidence))
    .execute(&mut **tx)
    .await
    .map_err(map_sqlx_error)?;
    Ok(())
}

fn conversation_from_row(row: &PgRow) -> Result<Conversation, StoreError> {
    let id: Uuid = row.try_get("id").map_err(map_sqlx_error)?;
    let channel: String = row.try_get("channel").map_err(map_sqlx_error)?;
    let status: String = row.try_get("status").map_err(map_sqlx_error)?;
    let dominant: String = row.try_get("summary_dominant").map_err(map_sqlx_error)?;
    let positive: i32 = row.try_get("summary_positive").map_err(map_sqlx_error)?;
    let negative: i32 = row.try_get("summary_negative").map_err(map_sqlx_error)?;
    let neutral: i32 = row.try_get("summary_neutral").map_err(map_sqlx_error)?;
    let total_messages: i32 = row
        .try_get("summary_total_messages")
        .map_err(map_sqlx_error)?;

    Ok(Conversation {
        id: ConversationId::from_uuid(id),
        owner_id: row.try_get("owner_id").map_err(map_sqlx_error)?,
        channel: channel.parse::<Channel>().map_err(StoreError::QueryFailed)?,
        customer_id: row.try_get("customer_id").map_err(map_sqlx_error)?,
        customer_name: row.try_get("customer_name").map_err(map_sqlx_error)?,
        customer_phone: row.try_get("customer_phone").map_err(map_sqlx_error)?,
        messages: Vec::new(),
        summary: SentimentSummary {
            positive: positive as u32,
            negative: negative as u32,
            neutral: neutral as u32,
            dominant: dominant
                .parse::<SentimentLabel>()
                .map_err(StoreError::QueryFailed)?,
            total_messages: total_messages as u32,
        },
        start_time: row.try_get("start_time").map_err(map_sqlx_error)?,
        end_time: row.try_get("end_time").map_err(map_sqlx_error)?,
        status: status
            .parse::<ConversationStatus>()
            .map_err(StoreError::QueryFailed)?,
        tags: row.try_get("tags").map_err(map_sqlx_error)?,
        handled: row.try_get("handled").map_err(map_sqlx_error)?,
        handled_at: row.try_get("handled_at").map_err(map_sqlx_error)?,
        handled_by: row.try_get("handled_by").map_err(map_sqlx_error)?,
    })
}

fn message_from_row(row: &PgRow) -> Result<Message, StoreError> {
    let sender: String = row.try_get("sender").map_err(map_sqlx_error)?;
    let message_type: String = row.try_get("message_type").map_err(map_sqlx_error)?;
    let sentiment_label: Option<String> =
        row.try_get("sentiment_label").map_err(map_sqlx_error)?;
    let sentiment_confidence: Option<f64> = row
        .try_get("sentiment_confidence")
        .map_err(map_sqlx_error)?;

    let sentiment = match (sentiment_label, sentiment_confidence) {
        (Some(label), confidence) => Some(Sentiment {
            label: label
                .parse::<SentimentLabel>()
                .map_err(StoreError::QueryFailed)?,
            // Rows written before confidence was recorded normalize to the
            // heuristic's neutral default.
            confidence: confidence.unwrap_or(0.6),
        }),
        (None, _) => None,
    };

    Ok(Message {
        id: row.try_get("id").map_err(map_sqlx_error)?,
        content: row.try_get("content").map_err(map_sqlx_error)?,
        sender: sender
            .parse::<crate::domain::MessageSender>()
            .map_err(StoreError::QueryFailed)?,
        timestamp: row.try_get("sent_at").map_err(map_sqlx_error)?,
        message_type: message_type
            .parse::<crate::domain::MessageType>()
            .map_err(StoreError::QueryFailed)?,
        sentiment,
    })
}

fn map_sqlx_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StoreError::ConstraintViolation(db.to_string());
        }
    }
    StoreError::QueryFailed(e.to_string())
}
