mod chat_message;
mod conversation;
mod history_item;
mod thread_state;

pub use chat_message::{ChatMessage, ChatRole};
pub use conversation::{Conversation, DEFAULT_TITLE};
pub use history_item::ChatHistoryItem;
pub use thread_state::{ThreadStateToken, EMPTY_THREAD_STATE};
