#[cfg(test)]
#[path = "analysis_test.rs"]
mod tests;

use std::{fmt::Display, str::FromStr};

use crate::config::constants::{SCORE_MAX, SCORE_MIN};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }

    pub fn next(&self) -> Sentiment {
        match self {
            Sentiment::Positive => Sentiment::Neutral,
            Sentiment::Neutral => Sentiment::Negative,
            Sentiment::Negative => Sentiment::Positive,
        }
    }
}

impl Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(Sentiment::Positive),
            "neutral" => Ok(Sentiment::Neutral),
            "negative" => Ok(Sentiment::Negative),
            other => Err(eyre::eyre!("unknown sentiment: {}", other)),
        }
    }
}

/// The eight bounded score columns of an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreField {
    Clarity,
    Relevance,
    Accuracy,
    Completeness,
    Coherence,
    Empathy,
    Politeness,
    Overall,
}

impl ScoreField {
    pub const ALL: [ScoreField; 8] = [
        ScoreField::Clarity,
        ScoreField::Relevance,
        ScoreField::Accuracy,
        ScoreField::Completeness,
        ScoreField::Coherence,
        ScoreField::Empathy,
        ScoreField::Politeness,
        ScoreField::Overall,
    ];

    /// Column name, as persisted
    pub fn name(&self) -> &'static str {
        match self {
            ScoreField::Clarity => "clarity_score",
            ScoreField::Relevance => "relevance_score",
            ScoreField::Accuracy => "accuracy_score",
            ScoreField::Completeness => "completeness_score",
            ScoreField::Coherence => "coherence_score",
            ScoreField::Empathy => "empathy_score",
            ScoreField::Politeness => "politeness_score",
            ScoreField::Overall => "overall_score",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreField::Clarity => "Clarity",
            ScoreField::Relevance => "Relevance",
            ScoreField::Accuracy => "Accuracy",
            ScoreField::Completeness => "Completeness",
            ScoreField::Coherence => "Coherence",
            ScoreField::Empathy => "Empathy",
            ScoreField::Politeness => "Politeness",
            ScoreField::Overall => "Overall",
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Raised before any write when one or more fields are out of range.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("validation failed: {}", join_fields(.0))]
pub struct ValidationError(pub Vec<FieldError>);

impl ValidationError {
    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// One-time quality assessment of a conversation, produced by an external
/// scoring process. Editable afterwards only through the admin form.
#[derive(Debug, Clone)]
pub struct ConversationAnalysis {
    id: String,
    conversation_id: String,
    clarity_score: f64,
    relevance_score: f64,
    accuracy_score: f64,
    completeness_score: f64,
    coherence_score: f64,
    empathy_score: f64,
    politeness_score: f64,
    overall_score: f64,
    sentiment: Sentiment,
    avg_response_time: Option<f64>,
    resolution: bool,
    escalation_needed: bool,
    fallback_frequency: i64,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl ConversationAnalysis {
    pub fn new(conversation_id: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            conversation_id: conversation_id.into(),
            clarity_score: 0.0,
            relevance_score: 0.0,
            accuracy_score: 0.0,
            completeness_score: 0.0,
            coherence_score: 0.0,
            empathy_score: 0.0,
            politeness_score: 0.0,
            overall_score: 0.0,
            sentiment: Sentiment::Neutral,
            avg_response_time: None,
            resolution: false,
            escalation_needed: false,
            fallback_frequency: 0,
            created_at: chrono::Utc::now(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_created_at(mut self, timestamp: chrono::DateTime<chrono::Utc>) -> Self {
        self.created_at = timestamp;
        self
    }

    pub fn with_score(mut self, field: ScoreField, value: f64) -> Self {
        self.set_score(field, value);
        self
    }

    pub fn with_sentiment(mut self, sentiment: Sentiment) -> Self {
        self.sentiment = sentiment;
        self
    }

    pub fn with_avg_response_time(mut self, seconds: Option<f64>) -> Self {
        self.avg_response_time = seconds;
        self
    }

    pub fn with_resolution(mut self, resolution: bool) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_escalation_needed(mut self, escalation_needed: bool) -> Self {
        self.escalation_needed = escalation_needed;
        self
    }

    pub fn with_fallback_frequency(mut self, count: i64) -> Self {
        self.fallback_frequency = count;
        self
    }

    pub fn score(&self, field: ScoreField) -> f64 {
        match field {
            ScoreField::Clarity => self.clarity_score,
            ScoreField::Relevance => self.relevance_score,
            ScoreField::Accuracy => self.accuracy_score,
            ScoreField::Completeness => self.completeness_score,
            ScoreField::Coherence => self.coherence_score,
            ScoreField::Empathy => self.empathy_score,
            ScoreField::Politeness => self.politeness_score,
            ScoreField::Overall => self.overall_score,
        }
    }

    pub fn set_score(&mut self, field: ScoreField, value: f64) {
        let slot = match field {
            ScoreField::Clarity => &mut self.clarity_score,
            ScoreField::Relevance => &mut self.relevance_score,
            ScoreField::Accuracy => &mut self.accuracy_score,
            ScoreField::Completeness => &mut self.completeness_score,
            ScoreField::Coherence => &mut self.coherence_score,
            ScoreField::Empathy => &mut self.empathy_score,
            ScoreField::Politeness => &mut self.politeness_score,
            ScoreField::Overall => &mut self.overall_score,
        };
        *slot = value;
    }

    pub fn set_sentiment(&mut self, sentiment: Sentiment) {
        self.sentiment = sentiment;
    }

    pub fn set_avg_response_time(&mut self, seconds: Option<f64>) {
        self.avg_response_time = seconds;
    }

    pub fn set_resolution(&mut self, resolution: bool) {
        self.resolution = resolution;
    }

    pub fn set_escalation_needed(&mut self, escalation_needed: bool) {
        self.escalation_needed = escalation_needed;
    }

    pub fn set_fallback_frequency(&mut self, count: i64) {
        self.fallback_frequency = count;
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn sentiment(&self) -> Sentiment {
        self.sentiment
    }

    pub fn avg_response_time(&self) -> Option<f64> {
        self.avg_response_time
    }

    pub fn resolution(&self) -> bool {
        self.resolution
    }

    pub fn escalation_needed(&self) -> bool {
        self.escalation_needed
    }

    pub fn fallback_frequency(&self) -> i64 {
        self.fallback_frequency
    }

    pub fn created_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.created_at
    }

    pub fn overall_score(&self) -> f64 {
        self.overall_score
    }

    /// Checks every bounded score against [0.0, 10.0] inclusive and reports
    /// all offending fields at once.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = vec![];
        for field in ScoreField::ALL {
            let value = self.score(field);
            if !(SCORE_MIN..=SCORE_MAX).contains(&value) {
                errors.push(FieldError {
                    field: field.name(),
                    message: format!(
                        "must be between {:.1} and {:.1}, got {}",
                        SCORE_MIN, SCORE_MAX, value
                    ),
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError(errors))
        }
    }
}
