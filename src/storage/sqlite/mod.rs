pub(crate) mod migration;

#[cfg(test)]
#[path = "sqlite_test.rs"]
mod tests;

use async_trait::async_trait;
use eyre::{Context, Result};
use tokio_rusqlite::{Connection, ToSql, named_params, params};

use crate::models::{
    AnalysisOverview, Conversation, ConversationAnalysis, ConversationOverview, FilterAnalysis,
    FilterConversation, FilterMessage, Message, MessageOverview, ScoreField, Sender, Sentiment,
};
use crate::storage::Storage;

pub struct Sqlite {
    conn: Connection,
}

impl Sqlite {
    pub async fn new(path: Option<&str>) -> Result<Self> {
        let conn = match path {
            Some(path) => Connection::open(path)
                .await
                .wrap_err(format!("opening database path: {}", path))?,
            None => Connection::open_in_memory()
                .await
                .wrap_err("opening in-memory database")?,
        };

        // SQLite leaves foreign keys off per connection; the cascade
        // rules on messages and analyses need them
        conn.call(|conn| Ok(conn.execute_batch("PRAGMA foreign_keys = ON")?))
            .await
            .wrap_err("enabling foreign keys")?;

        Ok(Self { conn })
    }

    pub async fn run_migration(&self) -> Result<()> {
        self.conn
            .call(|conn| Ok(conn.execute_batch(migration::MIGRATION)?))
            .await
            .wrap_err("executing migration")?;
        Ok(())
    }
}

#[async_trait]
impl Storage for Sqlite {
    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>> {
        let convo_id = id.to_string();
        let conversation = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, title, created_at, updated_at FROM conversations WHERE id = ?",
                )?;
                let mut rows = stmt.query(params![convo_id])?;

                let mut conversation: Option<Conversation> = None;
                if let Some(row) = rows.next()? {
                    let id: String = row.get(0)?;
                    let title: String = row.get(1)?;
                    let created_at = decode_timestamp(row.get(2)?)?;
                    let updated_at = decode_timestamp(row.get(3)?)?;

                    conversation = Some(
                        Conversation::default()
                            .with_id(id)
                            .with_title(title)
                            .with_created_at(created_at)
                            .with_updated_at(updated_at),
                    );
                }
                Ok(conversation)
            })
            .await?;

        let conversation = match conversation {
            Some(conversation) => conversation,
            None => return Ok(None),
        };

        let messages = self.get_messages(id).await?;
        let analysis = self.get_analysis(id).await?;

        Ok(Some(
            conversation.with_messages(messages).with_analysis(analysis),
        ))
    }

    async fn list_conversations(
        &self,
        filter: FilterConversation,
    ) -> Result<Vec<ConversationOverview>> {
        let overviews = self
            .conn
            .call(move |conn| {
                let (query, params) = conversation_filter_to_query(&filter);
                let mut stmt = conn.prepare(&query)?;
                let params: Vec<(&str, &dyn ToSql)> =
                    params.iter().map(|(n, v)| (*n, v.as_ref())).collect();
                let mut rows = stmt.query(params.as_slice())?;

                let mut overviews = vec![];
                while let Some(row) = rows.next()? {
                    let id: String = row.get(0)?;
                    let title: String = row.get(1)?;
                    let created_at = decode_timestamp(row.get(2)?)?;
                    let updated_at = decode_timestamp(row.get(3)?)?;
                    let message_count: i64 = row.get(4)?;
                    let has_analysis: bool = row.get(5)?;

                    overviews.push(
                        ConversationOverview::new(id, title, created_at, updated_at)
                            .with_message_count(message_count as usize)
                            .with_has_analysis(has_analysis),
                    );
                }
                Ok(overviews)
            })
            .await?;
        Ok(overviews)
    }

    async fn upsert_conversation(&self, conversation: Conversation) -> Result<()> {
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT INTO conversations (id, title, created_at, updated_at) \
                     VALUES (:id, :title, :created_at, :updated_at) \
                     ON CONFLICT (id) DO UPDATE SET title = excluded.title, updated_at = excluded.updated_at",
                    named_params! {
                        ":id": conversation.id(),
                        ":title": conversation.title(),
                        ":created_at": conversation.created_at().timestamp_millis(),
                        ":updated_at": conversation.updated_at().timestamp_millis(),
                    },
                )?;
                Ok(tx.commit()?)
            })
            .await
            .wrap_err("upserting conversation")?;
        Ok(())
    }

    async fn delete_conversation(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                // Messages and the analysis go with it via ON DELETE CASCADE
                tx.execute("DELETE FROM conversations WHERE id = ?", params![id])?;
                Ok(tx.commit()?)
            })
            .await
            .wrap_err("deleting conversation")?;
        Ok(())
    }

    async fn get_messages(&self, conversation_id: &str) -> Result<Vec<Message>> {
        let conversation_id = conversation_id.to_string();
        let messages = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, sender, text, created_at FROM messages \
                     WHERE conversation_id = ? ORDER BY created_at ASC",
                )?;

                let mut rows = stmt.query(params![conversation_id])?;
                let mut messages = vec![];
                while let Some(row) = rows.next()? {
                    let id: String = row.get(0)?;
                    let sender = decode_sender(row.get(1)?)?;
                    let text: String = row.get(2)?;
                    let created_at = decode_timestamp(row.get(3)?)?;

                    messages.push(
                        Message::new(sender, text)
                            .with_id(id)
                            .with_created_at(created_at),
                    );
                }
                Ok(messages)
            })
            .await?;
        Ok(messages)
    }

    async fn list_messages(&self, filter: FilterMessage) -> Result<Vec<MessageOverview>> {
        let overviews = self
            .conn
            .call(move |conn| {
                let (query, params) = message_filter_to_query(&filter);
                let mut stmt = conn.prepare(&query)?;
                let params: Vec<(&str, &dyn ToSql)> =
                    params.iter().map(|(n, v)| (*n, v.as_ref())).collect();
                let mut rows = stmt.query(params.as_slice())?;

                let mut overviews = vec![];
                while let Some(row) = rows.next()? {
                    let id: String = row.get(0)?;
                    let conversation_id: String = row.get(1)?;
                    let conversation_title: String = row.get(2)?;
                    let sender = decode_sender(row.get(3)?)?;
                    let text: String = row.get(4)?;
                    let created_at = decode_timestamp(row.get(5)?)?;

                    overviews.push(MessageOverview::new(
                        id,
                        conversation_id,
                        conversation_title,
                        sender,
                        text,
                        created_at,
                    ));
                }
                Ok(overviews)
            })
            .await?;
        Ok(overviews)
    }

    async fn add_messages(&self, conversation_id: &str, messages: &[Message]) -> Result<()> {
        if messages.is_empty() {
            return Ok(());
        }

        let conversation_id = conversation_id.to_string();
        let latest = messages
            .iter()
            .map(|m| m.created_at())
            .max()
            .unwrap_or_else(chrono::Utc::now);
        let messages = messages.to_vec();
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                for message in &messages {
                    tx.execute(
                        "INSERT INTO messages (id, conversation_id, sender, text, created_at) \
                         VALUES (:id, :conversation_id, :sender, :text, :created_at)",
                        named_params! {
                            ":id": message.id(),
                            ":conversation_id": conversation_id,
                            ":sender": message.sender().as_str(),
                            ":text": message.text(),
                            ":created_at": message.created_at().timestamp_millis(),
                        },
                    )?;
                }

                // Related data changed, touch the parent
                tx.execute(
                    "UPDATE conversations SET updated_at = :updated_at WHERE id = :id",
                    named_params! {
                        ":updated_at": latest.timestamp_millis(),
                        ":id": conversation_id,
                    },
                )?;
                Ok(tx.commit()?)
            })
            .await
            .wrap_err("adding messages")?;
        Ok(())
    }

    async fn get_analysis(&self, conversation_id: &str) -> Result<Option<ConversationAnalysis>> {
        let conversation_id = conversation_id.to_string();
        let analysis = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, conversation_id, clarity_score, relevance_score, accuracy_score, \
                     completeness_score, coherence_score, empathy_score, politeness_score, \
                     overall_score, sentiment, avg_response_time, resolution, escalation_needed, \
                     fallback_frequency, created_at FROM analyses WHERE conversation_id = ?",
                )?;
                let mut rows = stmt.query(params![conversation_id])?;

                let mut analysis: Option<ConversationAnalysis> = None;
                if let Some(row) = rows.next()? {
                    let id: String = row.get(0)?;
                    let conversation_id: String = row.get(1)?;
                    let sentiment = decode_sentiment(row.get(10)?)?;
                    let avg_response_time: Option<f64> = row.get(11)?;
                    let resolution: bool = row.get(12)?;
                    let escalation_needed: bool = row.get(13)?;
                    let fallback_frequency: i64 = row.get(14)?;
                    let created_at = decode_timestamp(row.get(15)?)?;

                    let mut record = ConversationAnalysis::new(conversation_id)
                        .with_id(id)
                        .with_sentiment(sentiment)
                        .with_avg_response_time(avg_response_time)
                        .with_resolution(resolution)
                        .with_escalation_needed(escalation_needed)
                        .with_fallback_frequency(fallback_frequency)
                        .with_created_at(created_at);

                    for (idx, field) in ScoreField::ALL.iter().enumerate() {
                        record.set_score(*field, row.get(2 + idx)?);
                    }
                    analysis = Some(record);
                }
                Ok(analysis)
            })
            .await?;
        Ok(analysis)
    }

    async fn list_analyses(&self, filter: FilterAnalysis) -> Result<Vec<AnalysisOverview>> {
        let overviews = self
            .conn
            .call(move |conn| {
                let (query, params) = analysis_filter_to_query(&filter);
                let mut stmt = conn.prepare(&query)?;
                let params: Vec<(&str, &dyn ToSql)> =
                    params.iter().map(|(n, v)| (*n, v.as_ref())).collect();
                let mut rows = stmt.query(params.as_slice())?;

                let mut overviews = vec![];
                while let Some(row) = rows.next()? {
                    let id: String = row.get(0)?;
                    let conversation_id: String = row.get(1)?;
                    let conversation_title: String = row.get(2)?;
                    let overall_score: f64 = row.get(3)?;
                    let sentiment = decode_sentiment(row.get(4)?)?;
                    let resolution: bool = row.get(5)?;
                    let escalation_needed: bool = row.get(6)?;
                    let created_at = decode_timestamp(row.get(7)?)?;

                    overviews.push(AnalysisOverview::new(
                        id,
                        conversation_id,
                        conversation_title,
                        overall_score,
                        sentiment,
                        resolution,
                        escalation_needed,
                        created_at,
                    ));
                }
                Ok(overviews)
            })
            .await?;
        Ok(overviews)
    }

    async fn create_analysis(&self, analysis: ConversationAnalysis) -> Result<()> {
        // Out-of-range scores never reach the database
        analysis.validate()?;

        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT INTO analyses (id, conversation_id, clarity_score, relevance_score, \
                     accuracy_score, completeness_score, coherence_score, empathy_score, \
                     politeness_score, overall_score, sentiment, avg_response_time, resolution, \
                     escalation_needed, fallback_frequency, created_at) \
                     VALUES (:id, :conversation_id, :clarity_score, :relevance_score, \
                     :accuracy_score, :completeness_score, :coherence_score, :empathy_score, \
                     :politeness_score, :overall_score, :sentiment, :avg_response_time, \
                     :resolution, :escalation_needed, :fallback_frequency, :created_at)",
                    named_params! {
                        ":id": analysis.id(),
                        ":conversation_id": analysis.conversation_id(),
                        ":clarity_score": analysis.score(ScoreField::Clarity),
                        ":relevance_score": analysis.score(ScoreField::Relevance),
                        ":accuracy_score": analysis.score(ScoreField::Accuracy),
                        ":completeness_score": analysis.score(ScoreField::Completeness),
                        ":coherence_score": analysis.score(ScoreField::Coherence),
                        ":empathy_score": analysis.score(ScoreField::Empathy),
                        ":politeness_score": analysis.score(ScoreField::Politeness),
                        ":overall_score": analysis.score(ScoreField::Overall),
                        ":sentiment": analysis.sentiment().as_str(),
                        ":avg_response_time": analysis.avg_response_time(),
                        ":resolution": analysis.resolution(),
                        ":escalation_needed": analysis.escalation_needed(),
                        ":fallback_frequency": analysis.fallback_frequency(),
                        ":created_at": analysis.created_at().timestamp_millis(),
                    },
                )?;

                tx.execute(
                    "UPDATE conversations SET updated_at = :updated_at WHERE id = :id",
                    named_params! {
                        ":updated_at": chrono::Utc::now().timestamp_millis(),
                        ":id": analysis.conversation_id(),
                    },
                )?;
                Ok(tx.commit()?)
            })
            .await
            .wrap_err("creating analysis")?;
        Ok(())
    }

    async fn update_analysis(&self, analysis: ConversationAnalysis) -> Result<()> {
        analysis.validate()?;

        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                // conversation_id and created_at never change after creation
                let affected = tx.execute(
                    "UPDATE analyses SET clarity_score = :clarity_score, \
                     relevance_score = :relevance_score, accuracy_score = :accuracy_score, \
                     completeness_score = :completeness_score, coherence_score = :coherence_score, \
                     empathy_score = :empathy_score, politeness_score = :politeness_score, \
                     overall_score = :overall_score, sentiment = :sentiment, \
                     avg_response_time = :avg_response_time, resolution = :resolution, \
                     escalation_needed = :escalation_needed, \
                     fallback_frequency = :fallback_frequency WHERE id = :id",
                    named_params! {
                        ":clarity_score": analysis.score(ScoreField::Clarity),
                        ":relevance_score": analysis.score(ScoreField::Relevance),
                        ":accuracy_score": analysis.score(ScoreField::Accuracy),
                        ":completeness_score": analysis.score(ScoreField::Completeness),
                        ":coherence_score": analysis.score(ScoreField::Coherence),
                        ":empathy_score": analysis.score(ScoreField::Empathy),
                        ":politeness_score": analysis.score(ScoreField::Politeness),
                        ":overall_score": analysis.score(ScoreField::Overall),
                        ":sentiment": analysis.sentiment().as_str(),
                        ":avg_response_time": analysis.avg_response_time(),
                        ":resolution": analysis.resolution(),
                        ":escalation_needed": analysis.escalation_needed(),
                        ":fallback_frequency": analysis.fallback_frequency(),
                        ":id": analysis.id(),
                    },
                )?;

                if affected == 0 {
                    return Err(tokio_rusqlite::Error::Other(
                        eyre::eyre!("analysis {} not found", analysis.id()).into(),
                    ));
                }

                tx.execute(
                    "UPDATE conversations SET updated_at = :updated_at WHERE id = :id",
                    named_params! {
                        ":updated_at": chrono::Utc::now().timestamp_millis(),
                        ":id": analysis.conversation_id(),
                    },
                )?;
                Ok(tx.commit()?)
            })
            .await
            .wrap_err("updating analysis")?;
        Ok(())
    }
}

fn decode_timestamp(
    millis: i64,
) -> Result<chrono::DateTime<chrono::Utc>, tokio_rusqlite::Error> {
    chrono::DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| tokio_rusqlite::Error::Other(eyre::eyre!("invalid timestamp").into()))
}

fn decode_sender(raw: String) -> Result<Sender, tokio_rusqlite::Error> {
    raw.parse()
        .map_err(|err: eyre::Report| tokio_rusqlite::Error::Other(err.into()))
}

fn decode_sentiment(raw: String) -> Result<Sentiment, tokio_rusqlite::Error> {
    raw.parse()
        .map_err(|err: eyre::Report| tokio_rusqlite::Error::Other(err.into()))
}

fn conversation_filter_to_query(
    filter: &FilterConversation,
) -> (String, Vec<(&str, Box<dyn ToSql>)>) {
    let mut query = String::from(
        "SELECT c.id, c.title, c.created_at, c.updated_at, \
         (SELECT COUNT(*) FROM messages m WHERE m.conversation_id = c.id) AS message_count, \
         EXISTS (SELECT 1 FROM analyses a WHERE a.conversation_id = c.id) AS has_analysis \
         FROM conversations c WHERE 1=1",
    );
    let mut params: Vec<(&str, Box<dyn ToSql>)> = vec![];

    if let Some(title) = filter.title() {
        query.push_str(" AND c.title LIKE :title");
        params.push((":title", Box::new(format!("%{}%", title))));
    }

    if let Some(created_from) = filter.created_from() {
        query.push_str(" AND c.created_at >= :created_from");
        params.push((":created_from", Box::new(created_from.timestamp_millis())));
    }

    if let Some(created_to) = filter.created_to() {
        query.push_str(" AND c.created_at <= :created_to");
        params.push((":created_to", Box::new(created_to.timestamp_millis())));
    }

    query.push_str(" ORDER BY c.created_at DESC");
    (query, params)
}

fn message_filter_to_query(filter: &FilterMessage) -> (String, Vec<(&str, Box<dyn ToSql>)>) {
    let mut query = String::from(
        "SELECT m.id, m.conversation_id, c.title, m.sender, m.text, m.created_at \
         FROM messages m JOIN conversations c ON c.id = m.conversation_id WHERE 1=1",
    );
    let mut params: Vec<(&str, Box<dyn ToSql>)> = vec![];

    if let Some(sender) = filter.sender() {
        query.push_str(" AND m.sender = :sender");
        params.push((":sender", Box::new(sender.as_str().to_string())));
    }

    if let Some(contains) = filter.contains() {
        query.push_str(" AND (m.text LIKE :contains OR c.title LIKE :contains)");
        params.push((":contains", Box::new(format!("%{}%", contains))));
    }

    if let Some(created_from) = filter.created_from() {
        query.push_str(" AND m.created_at >= :created_from");
        params.push((":created_from", Box::new(created_from.timestamp_millis())));
    }

    if let Some(created_to) = filter.created_to() {
        query.push_str(" AND m.created_at <= :created_to");
        params.push((":created_to", Box::new(created_to.timestamp_millis())));
    }

    query.push_str(" ORDER BY m.created_at ASC");
    (query, params)
}

fn analysis_filter_to_query(filter: &FilterAnalysis) -> (String, Vec<(&str, Box<dyn ToSql>)>) {
    let mut query = String::from(
        "SELECT a.id, a.conversation_id, c.title, a.overall_score, a.sentiment, a.resolution, \
         a.escalation_needed, a.created_at \
         FROM analyses a JOIN conversations c ON c.id = a.conversation_id WHERE 1=1",
    );
    let mut params: Vec<(&str, Box<dyn ToSql>)> = vec![];

    if let Some(sentiment) = filter.sentiment() {
        query.push_str(" AND a.sentiment = :sentiment");
        params.push((":sentiment", Box::new(sentiment.as_str().to_string())));
    }

    if let Some(resolution) = filter.resolution() {
        query.push_str(" AND a.resolution = :resolution");
        params.push((":resolution", Box::new(resolution)));
    }

    if let Some(escalation_needed) = filter.escalation_needed() {
        query.push_str(" AND a.escalation_needed = :escalation_needed");
        params.push((":escalation_needed", Box::new(escalation_needed)));
    }

    if let Some(title) = filter.title() {
        query.push_str(" AND c.title LIKE :title");
        params.push((":title", Box::new(format!("%{}%", title))));
    }

    if let Some(created_from) = filter.created_from() {
        query.push_str(" AND a.created_at >= :created_from");
        params.push((":created_from", Box::new(created_from.timestamp_millis())));
    }

    if let Some(created_to) = filter.created_to() {
        query.push_str(" AND a.created_at <= :created_to");
        params.push((":created_to", Box::new(created_to.timestamp_millis())));
    }

    query.push_str(" ORDER BY a.created_at DESC");
    (query, params)
}
