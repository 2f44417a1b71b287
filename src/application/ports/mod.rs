mod conversation_store;
mod sentiment_classifier;

pub use conversation_store::{ConversationScope, CustomerProfile, ConversationStore, StoreError};
pub use sentiment_classifier::{
    Classification, ClassificationOrigin, LabelScores, Language, SentimentClassifier,
};
