pub mod sqlite;

use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

use async_trait::async_trait;
use eyre::Result;
use sqlite::Sqlite;

use crate::{
    config::StorageConfig,
    models::{
        AnalysisOverview, Conversation, ConversationAnalysis, ConversationOverview,
        FilterAnalysis, FilterConversation, FilterMessage, Message, MessageOverview,
    },
};

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Storage {
    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>>;
    async fn list_conversations(
        &self,
        filter: FilterConversation,
    ) -> Result<Vec<ConversationOverview>>;
    async fn upsert_conversation(&self, conversation: Conversation) -> Result<()>;
    async fn delete_conversation(&self, id: &str) -> Result<()>;

    async fn get_messages(&self, conversation_id: &str) -> Result<Vec<Message>>;
    async fn list_messages(&self, filter: FilterMessage) -> Result<Vec<MessageOverview>>;
    async fn add_messages(&self, conversation_id: &str, messages: &[Message]) -> Result<()>;

    async fn get_analysis(&self, conversation_id: &str) -> Result<Option<ConversationAnalysis>>;
    async fn list_analyses(&self, filter: FilterAnalysis) -> Result<Vec<AnalysisOverview>>;
    async fn create_analysis(&self, analysis: ConversationAnalysis) -> Result<()>;
    async fn update_analysis(&self, analysis: ConversationAnalysis) -> Result<()>;
}

pub type ArcStorage = Arc<dyn Storage + Send + Sync>;

pub async fn new_storage(config: &StorageConfig) -> Result<ArcStorage> {
    let storage = match config {
        StorageConfig::Sqlite(sqlite_config) => {
            let sqlite = Sqlite::new(sqlite_config.path.as_deref()).await?;
            sqlite.run_migration().await?;
            Arc::new(sqlite)
        }
    };
    Ok(storage)
}
