use crate::application::ports::{Classification, ClassificationOrigin, LabelScores};
use crate::domain::SentimentLabel;

const POSITIVE_MARKERS: &[&str] = &["شكرا", "ممتاز", "رائع", "جيد", "أشكرك"];
const NEGATIVE_MARKERS: &[&str] = &["مشكلة", "سيء", "لا يعمل", "خطأ", "مزعج"];

const MATCH_CONFIDENCE: f64 = 0.8;
const NEUTRAL_CONFIDENCE: f64 = 0.6;

/// Deterministic lexical classifier used when the remote service is
/// unavailable. Confidence values are fixed and distinct from model output.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn classify(&self, text: &str) -> Classification {
        let text = text.to_lowercase();

        let (label, confidence) = if POSITIVE_MARKERS.iter().any(|m| text.contains(m)) {
            (SentimentLabel::Positive, MATCH_CONFIDENCE)
        } else if NEGATIVE_MARKERS.iter().any(|m| text.contains(m)) {
            (SentimentLabel::Negative, MATCH_CONFIDENCE)
        } else {
            (SentimentLabel::Neutral, NEUTRAL_CONFIDENCE)
        };

        Classification {
            label,
            confidence,
            scores: LabelScores::default(),
            origin: ClassificationOrigin::Fallback,
        }
    }
}
