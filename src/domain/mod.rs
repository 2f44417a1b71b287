mod channel;
mod conversation;
mod conversation_id;
mod conversation_status;
mod message;
mod sentiment;

pub use channel::Channel;
pub use conversation::Conversation;
pub use conversation_id::ConversationId;
pub use conversation_status::ConversationStatus;
pub use message::{Message, MessageSender, MessageType};
pub use sentiment::{Sentiment, SentimentLabel, SentimentSummary};
