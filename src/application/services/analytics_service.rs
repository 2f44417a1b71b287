use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::application::ports::{ConversationScope, ConversationStore, StoreError};
use crate::domain::{
    Channel, Conversation, ConversationStatus, MessageSender, SentimentLabel,
};

/// Lookback window for a report, measured from "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    Days7,
    Days30,
    Days90,
}

impl TimeRange {
    pub fn days(&self) -> i64 {
        match self {
            TimeRange::Days7 => 7,
            TimeRange::Days30 => 30,
            TimeRange::Days90 => 90,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Days7 => "7d",
            TimeRange::Days30 => "30d",
            TimeRange::Days90 => "90d",
        }
    }
}

impl FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "7d" => Ok(TimeRange::Days7),
            "30d" => Ok(TimeRange::Days30),
            "90d" => Ok(TimeRange::Days90),
            _ => Err(format!("Invalid time range: {} (expected 7d, 30d or 90d)", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalyticsQuery {
    pub time_range: TimeRange,
    pub channel: Option<Channel>,
    /// `None` aggregates across all owners (elevated callers).
    pub owner_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub total_conversations: u64,
    pub channels: ChannelCounts,
    pub sentiment: SentimentTotals,
    pub status: StatusCounts,
    pub total_messages: u64,
    pub average_messages_per_conversation: u64,
    pub response_time: ResponseTimeStats,
    pub daily_stats: Vec<DailyStat>,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelCounts {
    pub whatsapp: u64,
    pub messenger: u64,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentTotals {
    pub positive: u64,
    pub negative: u64,
    pub neutral: u64,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub active: u64,
    pub resolved: u64,
    pub archived: u64,
    pub escalated: u64,
}

/// Customer-to-agent reply gaps, in minutes. All zero when no gap exists.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseTimeStats {
    pub average: f64,
    pub fastest: f64,
    pub slowest: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStat {
    pub date: NaiveDate,
    pub conversations: u64,
    pub messages: u64,
    pub sentiment: SentimentTotals,
}

/// Read-only reporting over the conversation store.
pub struct AnalyticsService {
    store: Arc<dyn ConversationStore>,
}

impl AnalyticsService {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self { store }
    }

    pub async fn report(&self, query: &AnalyticsQuery) -> Result<AnalyticsReport, AnalyticsError> {
        self.report_at(query, Utc::now()).await
    }

    /// `now` is explicit so window arithmetic is deterministic under test.
    #[tracing::instrument(skip(self, query), fields(time_range = %query.time_range.as_str()))]
    pub async fn report_at(
        &self,
        query: &AnalyticsQuery,
        now: DateTime<Utc>,
    ) -> Result<AnalyticsReport, AnalyticsError> {
        let days = query.time_range.days();
        let since = now - Duration::days(days);
        let scope = ConversationScope {
            owner_id: query.owner_id.clone(),
            channel: query.channel,
        };

        let conversations = self
            .store
            .query_by_scope_and_time_range(&scope, since)
            .await?;

        let mut channels = ChannelCounts::default();
        let mut status = StatusCounts::default();
        let mut sentiment = SentimentTotals::default();
        let mut total_messages = 0u64;

        for conversation in &conversations {
            match conversation.channel {
                Channel::Whatsapp => channels.whatsapp += 1,
                Channel::Messenger => channels.messenger += 1,
            }
            match conversation.status {
                ConversationStatus::Active => status.active += 1,
                ConversationStatus::Resolved => status.resolved += 1,
                ConversationStatus::Archived => status.archived += 1,
                ConversationStatus::Escalated => status.escalated += 1,
            }
            total_messages += conversation.messages.len() as u64;
            accumulate_sentiment(&mut sentiment, conversation);
        }

        let average_messages_per_conversation = if conversations.is_empty() {
            0
        } else {
            (total_messages as f64 / conversations.len() as f64).round() as u64
        };

        Ok(AnalyticsReport {
            total_conversations: conversations.len() as u64,
            channels,
            sentiment,
            status,
            total_messages,
            average_messages_per_conversation,
            response_time: response_time_stats(&conversations),
            daily_stats: daily_stats(&conversations, now, days),
        })
    }
}

/// Message-level counting: every labeled message contributes, so the unit of
/// analysis is the message, not the conversation's dominant label.
fn accumulate_sentiment(totals: &mut SentimentTotals, conversation: &Conversation) {
    for message in &conversation.messages {
        if let Some(sentiment) = &message.sentiment {
            match sentiment.label {
                SentimentLabel::Positive => totals.positive += 1,
                SentimentLabel::Negative => totals.negative += 1,
                SentimentLabel::Neutral => totals.neutral += 1,
            }
        }
    }
}

/// For every customer message, the gap to the earliest agent message with a
/// strictly greater timestamp, within the same conversation. One agent reply
/// may close several customer messages that preceded it; that reuse is
/// intentional, so a slow first response to a burst is counted per message.
fn response_time_stats(conversations: &[Conversation]) -> ResponseTimeStats {
    let mut gaps: Vec<f64> = Vec::new();

    for conversation in conversations {
        for message in &conversation.messages {
            if message.sender != MessageSender::Customer {
                continue;
            }
            let reply = conversation
                .messages
                .iter()
                .filter(|m| m.sender == MessageSender::Agent && m.timestamp > message.timestamp)
                .min_by_key(|m| m.timestamp);
            if let Some(reply) = reply {
                let gap = (reply.timestamp - message.timestamp).num_seconds() as f64 / 60.0;
                gaps.push(gap);
            }
        }
    }

    if gaps.is_empty() {
        return ResponseTimeStats::default();
    }

    let sum: f64 = gaps.iter().sum();
    let fastest = gaps.iter().cloned().fold(f64::INFINITY, f64::min);
    let slowest = gaps.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    ResponseTimeStats {
        average: sum / gaps.len() as f64,
        fastest,
        slowest,
    }
}

/// One entry per day of the window, oldest first, zero-filled for days with
/// no matching conversations. Conversations bucket by the calendar date of
/// their `start_time`.
fn daily_stats(conversations: &[Conversation], now: DateTime<Utc>, days: i64) -> Vec<DailyStat> {
    let mut stats = Vec::with_capacity(days as usize);

    for offset in (0..days).rev() {
        let date = (now - Duration::days(offset)).date_naive();
        let mut day = DailyStat {
            date,
            conversations: 0,
            messages: 0,
            sentiment: SentimentTotals::default(),
        };

        for conversation in conversations {
            if conversation.start_time.date_naive() != date {
                continue;
            }
            day.conversations += 1;
            day.messages += conversation.messages.len() as u64;
            accumulate_sentiment(&mut day.sentiment, conversation);
        }

        stats.push(day);
    }

    stats
}

#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("store: {0}")]
    Store(#[from] StoreError),
}
