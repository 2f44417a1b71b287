use std::sync::Arc;

use crate::application::ports::{ConversationStore, SentimentClassifier};
use crate::application::services::{AnalyticsService, IngestionService};

#[derive(Clone)]
pub struct AppState {
    pub ingestion_service: Arc<IngestionService>,
    pub analytics_service: Arc<AnalyticsService>,
    pub classifier: Arc<dyn SentimentClassifier>,
    pub store: Arc<dyn ConversationStore>,
}
