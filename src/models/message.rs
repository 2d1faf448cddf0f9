#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use std::{fmt::Display, str::FromStr};

use crate::config::constants::PREVIEW_LENGTH;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Ai,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Ai => "ai",
        }
    }
}

impl Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Sender {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Sender::User),
            "ai" => Ok(Sender::Ai),
            other => Err(eyre::eyre!("unknown sender: {}", other)),
        }
    }
}

/// One turn of dialogue. Immutable once stored; removed only when its
/// conversation is deleted.
#[derive(Debug, Clone)]
pub struct Message {
    id: String,
    sender: Sender,
    text: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl Message {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sender,
            text: text.into(),
            created_at: chrono::Utc::now(),
        }
    }

    pub fn new_user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    pub fn new_ai(text: impl Into<String>) -> Self {
        Self::new(Sender::Ai, text)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_created_at(mut self, timestamp: chrono::DateTime<chrono::Utc>) -> Self {
        self.created_at = timestamp;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
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
        preview(&self.text)
    }
}

/// Truncated display text for the admin lists: the first 50 characters,
/// with an ellipsis only when the full text is longer.
pub fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(PREVIEW_LENGTH).collect();
    if text.chars().count() > PREVIEW_LENGTH {
        out.push_str("...");
    }
    out
}
