use async_trait::async_trait;

use crate::domain::SentimentLabel;

/// Language hint forwarded to the classification backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    Arabic,
    English,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Arabic => "ar",
            Language::English => "en",
        }
    }
}

/// Where a classification came from, so callers can tell model output from
/// the local heuristic without comparing confidence values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationOrigin {
    Model,
    Fallback,
}

/// Per-label probability mass as reported by the remote model.
#[derive(Debug, Clone, Copy)]
pub struct LabelScores {
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
}

impl Default for LabelScores {
    fn default() -> Self {
        Self {
            positive: 0.33,
            negative: 0.33,
            neutral: 0.34,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Classification {
    pub label: SentimentLabel,
    /// In [0, 1].
    pub confidence: f64,
    pub scores: LabelScores,
    pub origin: ClassificationOrigin,
}

/// Text classification with bounded concurrency and a deterministic local
/// fallback. Infallible by contract: every failure mode of the remote
/// service resolves to a fallback result, never an error.
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    async fn classify(&self, text: &str, language: Language) -> Classification;

    /// One result per input, in input order, never fewer.
    async fn classify_batch(&self, texts: &[String], language: Language) -> Vec<Classification>;
}
