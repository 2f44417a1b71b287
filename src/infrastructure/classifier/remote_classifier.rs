use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::application::ports::{
    Classification, ClassificationOrigin, LabelScores, Language, SentimentClassifier,
};
use crate::domain::SentimentLabel;

use super::KeywordClassifier;

/// Positional labels used by the remote model when it reports classes by
/// index: 0=negative, 1=neutral, 2=positive.
const INDEX_LABELS: [SentimentLabel; 3] = [
    SentimentLabel::Negative,
    SentimentLabel::Neutral,
    SentimentLabel::Positive,
];

#[derive(Debug, Clone)]
pub struct RemoteClassifierConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    pub max_concurrent_requests: usize,
    pub batch_chunk_size: usize,
    pub batch_pause: Duration,
}

impl Default for RemoteClassifierConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout: Duration::from_secs(10),
            max_concurrent_requests: 3,
            batch_chunk_size: 5,
            batch_pause: Duration::from_millis(200),
        }
    }
}

/// Gateway to the remote sentiment model.
///
/// Every call waits on a fair semaphore owned by this instance, so at most
/// `max_concurrent_requests` requests are in flight regardless of how many
/// callers (or batches) are active, and waiters are released in submission
/// order. A single attempt is made per text; timeout, non-2xx status, and
/// malformed payloads all resolve to the keyword fallback.
pub struct RemoteClassifier {
    client: Client,
    base_url: String,
    limiter: Semaphore,
    request_timeout: Duration,
    batch_chunk_size: usize,
    batch_pause: Duration,
    fallback: KeywordClassifier,
}

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct ClassifyResponse {
    predicted_class: String,
    confidence: f64,
    all_probabilities: Option<HashMap<String, f64>>,
}

impl RemoteClassifier {
    pub fn new(config: RemoteClassifierConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            limiter: Semaphore::new(config.max_concurrent_requests),
            request_timeout: config.request_timeout,
            batch_chunk_size: config.batch_chunk_size,
            batch_pause: config.batch_pause,
            fallback: KeywordClassifier,
        }
    }

    async fn request(&self, text: &str) -> Result<Classification, RemoteError> {
        let response = self
            .client
            .post(format!("{}/classify", self.base_url))
            .timeout(self.request_timeout)
            .json(&ClassifyRequest { text })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RemoteError::Status(response.status().as_u16()));
        }

        let payload: ClassifyResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::InvalidPayload(e.to_string()))?;

        normalize(payload)
    }
}

#[async_trait]
impl SentimentClassifier for RemoteClassifier {
    async fn classify(&self, text: &str, language: Language) -> Classification {
        let _permit = self
            .limiter
            .acquire()
            .await
            .expect("classifier semaphore closed");

        match self.request(text).await {
            Ok(classification) => classification,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    language = language.as_str(),
                    "Remote classification failed, using keyword fallback"
                );
                self.fallback.classify(text)
            }
        }
    }

    async fn classify_batch(&self, texts: &[String], language: Language) -> Vec<Classification> {
        let mut results = Vec::with_capacity(texts.len());
        let chunks: Vec<&[String]> = texts.chunks(self.batch_chunk_size.max(1)).collect();
        let chunk_count = chunks.len();

        for (index, chunk) in chunks.into_iter().enumerate() {
            let chunk_results = join_all(chunk.iter().map(|t| self.classify(t, language))).await;
            results.extend(chunk_results);

            // Pause between chunks so a large batch does not saturate the
            // remote service; the last chunk needs no trailing pause.
            if index + 1 < chunk_count {
                tokio::time::sleep(self.batch_pause).await;
            }
        }

        tracing::debug!(total = results.len(), "Batch classification completed");
        results
    }
}

fn normalize(payload: ClassifyResponse) -> Result<Classification, RemoteError> {
    let scores = payload
        .all_probabilities
        .as_ref()
        .map(scores_from_probabilities)
        .unwrap_or_default();

    let label = match payload.predicted_class.parse::<SentimentLabel>() {
        Ok(label) => label,
        Err(_) => label_from_index(payload.all_probabilities.as_ref())?,
    };

    Ok(Classification {
        label,
        confidence: payload.confidence.clamp(0.0, 1.0),
        scores,
        origin: ClassificationOrigin::Model,
    })
}

fn scores_from_probabilities(probabilities: &HashMap<String, f64>) -> LabelScores {
    LabelScores {
        negative: probabilities.get("0").copied().unwrap_or(0.0),
        neutral: probabilities.get("1").copied().unwrap_or(0.0),
        positive: probabilities.get("2").copied().unwrap_or(0.0),
    }
}

/// Applies the fixed index mapping when the model reports a class the label
/// enum does not know: the highest-probability index wins.
fn label_from_index(
    probabilities: Option<&HashMap<String, f64>>,
) -> Result<SentimentLabel, RemoteError> {
    let probabilities = probabilities.ok_or_else(|| {
        RemoteError::InvalidPayload("unknown predicted_class without probabilities".to_string())
    })?;

    let mut best: Option<(SentimentLabel, f64)> = None;
    for (index, label) in INDEX_LABELS.iter().enumerate() {
        if let Some(&probability) = probabilities.get(index.to_string().as_str()) {
            if best.map_or(true, |(_, p)| probability > p) {
                best = Some((*label, probability));
            }
        }
    }

    best.map(|(label, _)| label).ok_or_else(|| {
        RemoteError::InvalidPayload("probabilities missing positional keys".to_string())
    })
}

#[derive(Debug, thiserror::Error)]
enum RemoteError {
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}
