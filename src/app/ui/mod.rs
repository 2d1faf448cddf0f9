pub mod analyses;
pub mod analysis_form;
pub mod conversations;
pub mod detail;
pub mod input_box;
pub mod messages;
pub mod notice;
pub mod question;
pub mod utils;

pub use analyses::AnalysesScreen;
pub use conversations::ConversationsScreen;
pub use messages::MessagesScreen;
pub use notice::Notice;
