mod memory_conversation_store;
mod pg_conversation_store;
mod pg_pool;

pub use memory_conversation_store::InMemoryConversationStore;
pub use pg_conversation_store::PgConversationStore;
pub use pg_pool::create_pool;
