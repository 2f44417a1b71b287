use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use mashaer::application::ports::{ConversationStore, Language, SentimentClassifier};
use mashaer::application::services::{AnalyticsService, IngestionService};
use mashaer::infrastructure::classifier::{RemoteClassifier, RemoteClassifierConfig};
use mashaer::infrastructure::observability::{init_tracing, TracingConfig};
use mashaer::infrastructure::persistence::{create_pool, PgConversationStore};
use mashaer::presentation::{create_router, AppState, Environment, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let settings = Settings::load(environment)?;

    init_tracing(TracingConfig::default(), settings.server.port);

    let pool = create_pool(&settings.database.url, settings.database.max_connections).await?;
    sqlx::migrate!().run(&pool).await?;

    let store: Arc<dyn ConversationStore> = Arc::new(PgConversationStore::new(pool));
    let classifier: Arc<dyn SentimentClassifier> =
        Arc::new(RemoteClassifier::new(RemoteClassifierConfig {
            base_url: settings.classifier.base_url.clone(),
            request_timeout: Duration::from_secs(settings.classifier.timeout_seconds),
            max_concurrent_requests: settings.classifier.max_concurrent_requests,
            batch_chunk_size: settings.classifier.batch_chunk_size,
            batch_pause: Duration::from_millis(settings.classifier.batch_pause_ms),
        }));

    let ingestion_service = Arc::new(IngestionService::new(
        Arc::clone(&classifier),
        Arc::clone(&store),
        Language::Arabic,
    ));
    let analytics_service = Arc::new(AnalyticsService::new(Arc::clone(&store)));

    let state = AppState {
        ingestion_service,
        analytics_service,
        classifier,
        store,
    };

    let router = create_router(state);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
