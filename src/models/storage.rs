use crate::models::{Sender, Sentiment, message};

/// Listing filter for conversations. Unset fields add no predicate.
#[derive(Debug, Clone, Default)]
pub struct FilterConversation {
    title: Option<String>,
    created_from: Option<chrono::DateTime<chrono::Utc>>,
    created_to: Option<chrono::DateTime<chrono::Utc>>,
}

impl FilterConversation {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_created_from(mut self, timestamp: chrono::DateTime<chrono::Utc>) -> Self {
        self.created_from = Some(timestamp);
        self
    }

    pub fn with_created_to(mut self, timestamp: chrono::DateTime<chrono::Utc>) -> Self {
        self.created_to = Some(timestamp);
        self
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn created_from(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.created_from
    }

    pub fn created_to(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.created_to
    }
}

/// Listing filter for messages across all conversations.
#[derive(Debug, Clone, Default)]
pub struct FilterMessage {
    sender: Option<Sender>,
    // Matches the message text or the parent conversation title
    contains: Option<String>,
    created_from: Option<chrono::DateTime<chrono::Utc>>,
    created_to: Option<chrono::DateTime<chrono::Utc>>,
}

impl FilterMessage {
    pub fn with_sender(mut self, sender: Sender) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn with_contains(mut self, contains: impl Into<String>) -> Self {
        self.contains = Some(contains.into());
        self
    }

    pub fn with_created_from(mut self, timestamp: chrono::DateTime<chrono::Utc>) -> Self {
        self.created_from = Some(timestamp);
        self
    }

    pub fn with_created_to(mut self, timestamp: chrono::DateTime<chrono::Utc>) -> Self {
        self.created_to = Some(timestamp);
        self
    }

    pub fn sender(&self) -> Option<Sender> {
        self.sender
    }

    pub fn contains(&self) -> Option<&str> {
        self.contains.as_deref()
    }

    pub fn created_from(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.created_from
    }

    pub fn created_to(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.created_to
    }
}

/// Listing filter for analyses.
#[derive(Debug, Clone, Default)]
pub struct FilterAnalysis {
    sentiment: Option<Sentiment>,
    resolution: Option<bool>,
    escalation_needed: Option<bool>,
    // Matches the parent conversation title
    title: Option<String>,
    created_from: Option<chrono::DateTime<chrono::Utc>>,
    created_to: Option<chrono::DateTime<chrono::Utc>>,
}

impl FilterAnalysis {
    pub fn with_sentiment(mut self, sentiment: Sentiment) -> Self {
        self.sentiment = Some(sentiment);
        self
    }

    pub fn with_resolution(mut self, resolution: bool) -> Self {
        self.resolution = Some(resolution);
        self
    }

    pub fn with_escalation_needed(mut self, escalation_needed: bool) -> Self {
        self.escalation_needed = Some(escalation_needed);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_created_from(mut self, timestamp: chrono::DateTime<chrono::Utc>) -> Self {
        self.created_from = Some(timestamp);
        self
    }

    pub fn with_created_to(mut self, timestamp: chrono::DateTime<chrono::Utc>) -> Self {
        self.created_to = Some(timestamp);
        self
    }

    pub fn sentiment(&self) -> Option<Sentiment> {
        self.sentiment
    }

    pub fn resolution(&self) -> Option<bool> {
        self.resolution
    }

    pub fn escalation_needed(&self) -> Option<bool> {
        self.escalation_needed
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn created_from(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.created_from
    }

    pub fn created_to(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.created_to
    }
}

/// One conversation row in the admin list. `message_count` and
/// `has_analysis` are derived from related rows at query time, never stored.
#[derive(Debug, Clone)]
pub struct ConversationOverview {
    id: String,
    title: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
    message_count: usize,
    has_analysis: bool,
}

impl ConversationOverview {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        created_at: chrono::DateTime<chrono::Utc>,
        updated_at: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            created_at,
            updated_at,
            message_count: 0,
            has_analysis: false,
        }
    }

    pub fn with_message_count(mut self, count: usize) -> Self {
        self.message_count = count;
        self
    }

    pub fn with_has_analysis(mut self, has_analysis: bool) -> Self {
        self.has_analysis = has_analysis;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn created_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.updated_at
    }

    pub fn message_count(&self) -> usize {
        self.message_count
    }

    pub fn has_analysis(&self) -> bool {
        self.has_analysis
    }
}

/// One message row in the admin list, joined with the parent title.
#[derive(Debug, Clone)]
pub struct MessageOverview {
    id: String,
    conversation_id: String,
    conversation_title: String,
    sender: Sender,
    text: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl MessageOverview {
    pub fn new(
        id: impl Into<String>,
        conversation_id: impl Into<String>,
        conversation_title: impl Into<String>,
        sender: Sender,
        text: impl Into<String>,
        created_at: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            conversation_id: conversation_id.into(),
            conversation_title: conversation_title.into(),
            sender,
            text: text.into(),
            created_at,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn conversation_title(&self) -> &str {
        &self.conversation_title
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn created_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.created_at
    }

    pub fn preview(&self) -> String {
        message::preview(&self.text)
    }
}

/// One analysis row in the admin list, joined with the parent title.
#[derive(Debug, Clone)]
pub struct AnalysisOverview {
    id: String,
    conversation_id: String,
    conversation_title: String,
    overall_score: f64,
    sentiment: Sentiment,
    resolution: bool,
    escalation_needed: bool,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl AnalysisOverview {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        conversation_id: impl Into<String>,
        conversation_title: impl Into<String>,
        overall_score: f64,
        sentiment: Sentiment,
        resolution: bool,
        escalation_needed: bool,
        created_at: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            conversation_id: conversation_id.into(),
            conversation_title: conversation_title.into(),
            overall_score,
            sentiment,
            resolution,
            escalation_needed,
            created_at,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn conversation_title(&self) -> &str {
        &self.conversation_title
    }

    pub fn overall_score(&self) -> f64 {
        self.overall_score
    }

    pub fn sentiment(&self) -> Sentiment {
        self.sentiment
    }

    pub fn resolution(&self) -> bool {
        self.resolution
    }

    pub fn escalation_needed(&self) -> bool {
        self.escalation_needed
    }

    pub fn created_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.created_at
    }
}
