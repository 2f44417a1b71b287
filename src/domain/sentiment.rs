use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        }
    }
}

impl FromStr for SentimentLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(SentimentLabel::Positive),
            "negative" => Ok(SentimentLabel::Negative),
            "neutral" => Ok(SentimentLabel::Neutral),
            _ => Err(format!("Invalid sentiment label: {}", s)),
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sentiment attached to a single message, normalized at the persistence
/// boundary into one tagged shape regardless of how the classifier reported
/// it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sentiment {
    pub label: SentimentLabel,
    /// In [0, 1].
    pub confidence: f64,
}

/// Conversation-level sentiment rollup, derived from the message list and
/// never independently authoritative.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentSummary {
    pub positive: u32,
    pub negative: u32,
    pub neutral: u32,
    pub dominant: SentimentLabel,
    /// Full message count, including unlabeled (non-text) messages.
    pub total_messages: u32,
}

impl SentimentSummary {
    /// Derive a summary from a conversation's message list.
    ///
    /// Pure function: no I/O, deterministic on identical input. Messages
    /// without a sentiment count toward `total_messages` only, so
    /// `positive + negative + neutral <= total_messages` always holds.
    ///
    /// The dominant label is chosen by strictly greatest count; ties fall to
    /// the earlier label in the fixed order negative, neutral, positive, so
    /// ambiguous conversations surface as the more urgent label. All-zero
    /// counts report neutral.
    pub fn from_messages(messages: &[Message]) -> Self {
        let mut positive = 0u32;
        let mut negative = 0u32;
        let mut neutral = 0u32;

        for message in messages {
            if let Some(sentiment) = &message.sentiment {
                match sentiment.label {
                    SentimentLabel::Positive => positive += 1,
                    SentimentLabel::Negative => negative += 1,
                    SentimentLabel::Neutral => neutral += 1,
                }
            }
        }

        let ordered = [
            (SentimentLabel::Negative, negative),
            (SentimentLabel::Neutral, neutral),
            (SentimentLabel::Positive, positive),
        ];

        let mut dominant = SentimentLabel::Neutral;
        let mut best = 0u32;
        for (label, count) in ordered {
            if count > best {
                best = count;
                dominant = label;
            }
        }

        Self {
            positive,
            negative,
            neutral,
            dominant,
            total_messages: messages.len() as u32,
        }
    }
}

impl Default for SentimentSummary {
    fn default() -> Self {
        Self {
            positive: 0,
            negative: 0,
            neutral: 0,
            dominant: SentimentLabel::Neutral,
            total_messages: 0,
        }
    }
}
