pub mod conversation;
pub mod history;

pub use conversation::MongoConversationRepository;
pub use history::MongoHistoryRepository;
