mod analytics;
mod analyze;
mod conversations;
mod health;
mod messages;

use serde::Serialize;

pub use analytics::analytics_handler;
pub use analyze::analyze_handler;
pub use conversations::{list_conversations_handler, set_handled_handler, set_status_handler};
pub use health::health_handler;
pub use messages::ingest_message_handler;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
