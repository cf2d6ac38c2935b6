pub mod error;
pub mod view;
pub mod title;
pub mod service;

pub use error::{ConversationError, Result};
pub use view::{ConversationDetail, ConversationSummary, MessageView};
pub use title::{normalize_title, TitleGenerator, MAX_TITLE_CHARS};
pub use service::{ConversationService, DeltaStream};
