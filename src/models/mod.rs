pub mod analysis;
pub mod conversation;
pub mod event;
pub mod message;
pub mod notice;
pub mod storage;

pub use analysis::{ConversationAnalysis, FieldError, ScoreField, Sentiment, ValidationError};
pub use conversation::Conversation;
pub use event::Event;
pub use message::{Message, Sender};
pub use notice::*;
pub use storage::*;
