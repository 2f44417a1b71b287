mod analytics_service;
mod ingestion_service;

pub use analytics_service::{
    AnalyticsError, AnalyticsQuery, AnalyticsReport, AnalyticsService, ChannelCounts, DailyStat,
    ResponseTimeStats, SentimentTotals, StatusCounts, TimeRange,
};
pub use ingestion_service::{InboundMessage, IngestError, IngestionService};
