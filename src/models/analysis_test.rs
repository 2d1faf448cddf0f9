use super::*;

#[test]
fn test_validate_accepts_boundary_values() {
    let mut analysis = ConversationAnalysis::new("convo_1");
    for field in ScoreField::ALL {
        analysis.set_score(field, 0.0);
    }
    assert!(analysis.validate().is_ok());

    for field in ScoreField::ALL {
        analysis.set_score(field, 10.0);
    }
    assert!(analysis.validate().is_ok());
}

#[test]
fn test_validate_rejects_out_of_range() {
    let analysis = ConversationAnalysis::new("convo_1").with_score(ScoreField::Clarity, 10.1);

    let err = analysis.validate().unwrap_err();
    assert_eq!(err.fields().len(), 1);
    assert_eq!(err.fields()[0].field, "clarity_score");

    let analysis = ConversationAnalysis::new("convo_1").with_score(ScoreField::Overall, -0.1);
    let err = analysis.validate().unwrap_err();
    assert_eq!(err.fields()[0].field, "overall_score");
}

#[test]
fn test_validate_reports_every_offending_field() {
    let analysis = ConversationAnalysis::new("convo_1")
        .with_score(ScoreField::Clarity, -1.0)
        .with_score(ScoreField::Empathy, 11.0)
        .with_score(ScoreField::Overall, 42.0);

    let err = analysis.validate().unwrap_err();
    let fields: Vec<&str> = err.fields().iter().map(|e| e.field).collect();
    assert_eq!(fields, vec!["clarity_score", "empathy_score", "overall_score"]);

    let text = err.to_string();
    assert!(text.contains("clarity_score"));
    assert!(text.contains("empathy_score"));
    assert!(text.contains("overall_score"));
}

#[test]
fn test_validate_rejects_nan() {
    let analysis = ConversationAnalysis::new("convo_1").with_score(ScoreField::Accuracy, f64::NAN);
    let err = analysis.validate().unwrap_err();
    assert_eq!(err.fields()[0].field, "accuracy_score");
}

#[test]
fn test_new_analysis_defaults() {
    let analysis = ConversationAnalysis::new("convo_1");
    assert_eq!(analysis.conversation_id(), "convo_1");
    assert_eq!(analysis.sentiment(), Sentiment::Neutral);
    assert_eq!(analysis.fallback_frequency(), 0);
    assert_eq!(analysis.avg_response_time(), None);
    assert!(!analysis.resolution());
    assert!(!analysis.escalation_needed());
    assert!(analysis.validate().is_ok());
}

#[test]
fn test_sentiment_round_trip() {
    use std::str::FromStr;
    for sentiment in [Sentiment::Positive, Sentiment::Neutral, Sentiment::Negative] {
        assert_eq!(Sentiment::from_str(sentiment.as_str()).unwrap(), sentiment);
    }
    assert!(Sentiment::from_str("mixed").is_err());
}

#[test]
fn test_sentiment_cycle() {
    let mut s = Sentiment::Positive;
    s = s.next();
    assert_eq!(s, Sentiment::Neutral);
    s = s.next();
    assert_eq!(s, Sentiment::Negative);
    s = s.next();
    assert_eq!(s, Sentiment::Positive);
}
