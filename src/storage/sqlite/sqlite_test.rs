use super::*;
use crate::models::ValidationError;

const CONVERSATION_BASE: &str = "SELECT c.id, c.title, c.created_at, c.updated_at, \
     (SELECT COUNT(*) FROM messages m WHERE m.conversation_id = c.id) AS message_count, \
     EXISTS (SELECT 1 FROM analyses a WHERE a.conversation_id = c.id) AS has_analysis \
     FROM conversations c WHERE 1=1";

const MESSAGE_BASE: &str = "SELECT m.id, m.conversation_id, c.title, m.sender, m.text, m.created_at \
     FROM messages m JOIN conversations c ON c.id = m.conversation_id WHERE 1=1";

const ANALYSIS_BASE: &str = "SELECT a.id, a.conversation_id, c.title, a.overall_score, a.sentiment, a.resolution, \
     a.escalation_needed, a.created_at \
     FROM analyses a JOIN conversations c ON c.id = a.conversation_id WHERE 1=1";

#[test]
fn test_conversation_filter_to_query() {
    let mut filter = FilterConversation::default();
    let (query, params) = conversation_filter_to_query(&filter);
    assert_eq!(
        query,
        format!("{} ORDER BY c.created_at DESC", CONVERSATION_BASE)
    );
    assert!(params.is_empty());

    filter = filter.with_title("Support");
    let (query, params) = conversation_filter_to_query(&filter);
    assert_eq!(
        query,
        format!(
            "{} AND c.title LIKE :title ORDER BY c.created_at DESC",
            CONVERSATION_BASE
        )
    );
    assert_eq!(params.len(), 1);
    assert_eq!(params[0].0, ":title");

    filter = filter
        .with_created_from(chrono::Utc::now())
        .with_created_to(chrono::Utc::now());
    let (query, params) = conversation_filter_to_query(&filter);
    assert_eq!(
        query,
        format!(
            "{} AND c.title LIKE :title AND c.created_at >= :created_from \
             AND c.created_at <= :created_to ORDER BY c.created_at DESC",
            CONVERSATION_BASE
        )
    );
    assert_eq!(params.len(), 3);
    assert_eq!(params[0].0, ":title");
    assert_eq!(params[1].0, ":created_from");
    assert_eq!(params[2].0, ":created_to");
}

#[test]
fn test_message_filter_to_query() {
    let mut filter = FilterMessage::default();
    let (query, params) = message_filter_to_query(&filter);
    assert_eq!(query, format!("{} ORDER BY m.created_at ASC", MESSAGE_BASE));
    assert!(params.is_empty());

    filter = filter.with_sender(Sender::Ai).with_contains("help");
    let (query, params) = message_filter_to_query(&filter);
    assert_eq!(
        query,
        format!(
            "{} AND m.sender = :sender \
             AND (m.text LIKE :contains OR c.title LIKE :contains) \
             ORDER BY m.created_at ASC",
            MESSAGE_BASE
        )
    );
    assert_eq!(params.len(), 2);
    assert_eq!(params[0].0, ":sender");
    assert_eq!(params[1].0, ":contains");
}

#[test]
fn test_analysis_filter_to_query() {
    let mut filter = FilterAnalysis::default();
    let (query, params) = analysis_filter_to_query(&filter);
    assert_eq!(
        query,
        format!("{} ORDER BY a.created_at DESC", ANALYSIS_BASE)
    );
    assert!(params.is_empty());

    filter = filter
        .with_sentiment(Sentiment::Positive)
        .with_resolution(true)
        .with_escalation_needed(false)
        .with_title("Support");
    let (query, params) = analysis_filter_to_query(&filter);
    assert_eq!(
        query,
        format!(
            "{} AND a.sentiment = :sentiment AND a.resolution = :resolution \
             AND a.escalation_needed = :escalation_needed AND c.title LIKE :title \
             ORDER BY a.created_at DESC",
            ANALYSIS_BASE
        )
    );
    assert_eq!(params.len(), 4);
    assert_eq!(params[0].0, ":sentiment");
    assert_eq!(params[1].0, ":resolution");
    assert_eq!(params[2].0, ":escalation_needed");
    assert_eq!(params[3].0, ":title");
}

async fn new_db() -> Sqlite {
    let db = Sqlite::new(None).await.unwrap();
    db.run_migration().await.unwrap();
    db
}

fn valid_analysis(conversation_id: &str) -> ConversationAnalysis {
    ConversationAnalysis::new(conversation_id)
        .with_score(ScoreField::Clarity, 8.0)
        .with_score(ScoreField::Relevance, 7.5)
        .with_score(ScoreField::Accuracy, 9.0)
        .with_score(ScoreField::Completeness, 8.0)
        .with_score(ScoreField::Coherence, 8.5)
        .with_score(ScoreField::Empathy, 6.0)
        .with_score(ScoreField::Politeness, 9.5)
        .with_score(ScoreField::Overall, 8.5)
        .with_sentiment(Sentiment::Positive)
        .with_resolution(true)
        .with_escalation_needed(false)
}

#[tokio::test]
async fn test_upsert_and_get_conversation() {
    let db = new_db().await;

    let expected = Conversation::default()
        .with_id("test_id")
        .with_title("Test Conversation")
        .with_created_at(chrono::Utc::now());

    db.upsert_conversation(expected.clone()).await.unwrap();

    let actual = db.get_conversation("test_id").await.unwrap().unwrap();
    assert_eq!(actual.id(), "test_id");
    assert_eq!(actual.title(), "Test Conversation");
    assert_eq!(
        actual.created_at().timestamp_millis(),
        expected.created_at().timestamp_millis()
    );
    assert_eq!(actual.messages().len(), 0);
    assert!(!actual.has_analysis());

    let mut renamed = expected.clone();
    renamed.set_title("Updated Title");
    renamed.set_updated_at(chrono::Utc::now());
    db.upsert_conversation(renamed.clone()).await.unwrap();

    let actual = db.get_conversation("test_id").await.unwrap().unwrap();
    assert_eq!(actual.title(), "Updated Title");
    assert_eq!(
        actual.updated_at().timestamp_millis(),
        renamed.updated_at().timestamp_millis()
    );
    // created_at is set once
    assert_eq!(
        actual.created_at().timestamp_millis(),
        expected.created_at().timestamp_millis()
    );
}

#[tokio::test]
async fn test_get_conversation_not_exist() {
    let db = new_db().await;
    let actual = db.get_conversation("non_existent_id").await.unwrap();
    assert!(actual.is_none());
}

#[tokio::test]
async fn test_messages_returned_in_timestamp_order() {
    let db = new_db().await;
    let now = chrono::Utc::now();

    let conversation = Conversation::default()
        .with_id("test_id")
        .with_created_at(now - chrono::Duration::minutes(5));
    db.upsert_conversation(conversation).await.unwrap();

    // Insert newest first; retrieval must still be oldest first
    let newest = Message::new_ai("third")
        .with_id("msg3")
        .with_created_at(now);
    let middle = Message::new_ai("second")
        .with_id("msg2")
        .with_created_at(now - chrono::Duration::seconds(30));
    let oldest = Message::new_user("first")
        .with_id("msg1")
        .with_created_at(now - chrono::Duration::seconds(60));

    db.add_messages("test_id", &[newest, middle, oldest])
        .await
        .unwrap();

    let messages = db.get_messages("test_id").await.unwrap();
    let ids: Vec<&str> = messages.iter().map(|m| m.id()).collect();
    assert_eq!(ids, vec!["msg1", "msg2", "msg3"]);

    for pair in messages.windows(2) {
        assert!(pair[0].created_at() <= pair[1].created_at());
    }
}

#[tokio::test]
async fn test_delete_conversation_cascades() {
    let db = new_db().await;
    let now = chrono::Utc::now();

    let conversation = Conversation::default()
        .with_id("test_id")
        .with_title("Doomed")
        .with_created_at(now);
    db.upsert_conversation(conversation).await.unwrap();

    let messages = vec![
        Message::new_user("Hi").with_id("msg1").with_created_at(now),
        Message::new_ai("Hello, how can I help?")
            .with_id("msg2")
            .with_created_at(now + chrono::Duration::seconds(1)),
    ];
    db.add_messages("test_id", &messages).await.unwrap();
    db.create_analysis(valid_analysis("test_id")).await.unwrap();

    db.delete_conversation("test_id").await.unwrap();

    assert!(db.get_conversation("test_id").await.unwrap().is_none());
    assert!(db.get_messages("test_id").await.unwrap().is_empty());
    assert!(db.get_analysis("test_id").await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_conversations_with_derived_fields() {
    let db = new_db().await;
    let now = chrono::Utc::now();

    let support = Conversation::default()
        .with_id("support_id")
        .with_title("Support Chat")
        .with_created_at(now - chrono::Duration::minutes(1));
    db.upsert_conversation(support).await.unwrap();
    db.add_messages(
        "support_id",
        &[
            Message::new_user("Hi").with_created_at(now - chrono::Duration::seconds(50)),
            Message::new_ai("Hello, how can I help?")
                .with_created_at(now - chrono::Duration::seconds(40)),
        ],
    )
    .await
    .unwrap();
    db.create_analysis(valid_analysis("support_id")).await.unwrap();

    let empty = Conversation::default()
        .with_id("empty_id")
        .with_title("Empty Chat")
        .with_created_at(now);
    db.upsert_conversation(empty).await.unwrap();

    let overviews = db
        .list_conversations(FilterConversation::default())
        .await
        .unwrap();

    // Newest first
    assert_eq!(overviews.len(), 2);
    assert_eq!(overviews[0].id(), "empty_id");
    assert_eq!(overviews[0].message_count(), 0);
    assert!(!overviews[0].has_analysis());

    assert_eq!(overviews[1].id(), "support_id");
    assert_eq!(overviews[1].title(), "Support Chat");
    assert_eq!(overviews[1].message_count(), 2);
    assert!(overviews[1].has_analysis());

    let overviews = db
        .list_conversations(FilterConversation::default().with_title("Support"))
        .await
        .unwrap();
    assert_eq!(overviews.len(), 1);
    assert_eq!(overviews[0].id(), "support_id");
}

#[tokio::test]
async fn test_list_messages_with_filter() {
    let db = new_db().await;
    let now = chrono::Utc::now();

    let billing = Conversation::default()
        .with_id("billing_id")
        .with_title("Billing Question")
        .with_created_at(now);
    db.upsert_conversation(billing).await.unwrap();
    db.add_messages(
        "billing_id",
        &[
            Message::new_user("My invoice looks wrong")
                .with_id("msg1")
                .with_created_at(now),
            Message::new_ai("Let me take a look")
                .with_id("msg2")
                .with_created_at(now + chrono::Duration::seconds(1)),
        ],
    )
    .await
    .unwrap();

    let overviews = db.list_messages(FilterMessage::default()).await.unwrap();
    assert_eq!(overviews.len(), 2);
    assert_eq!(overviews[0].id(), "msg1");
    assert_eq!(overviews[0].conversation_title(), "Billing Question");

    let overviews = db
        .list_messages(FilterMessage::default().with_sender(Sender::Ai))
        .await
        .unwrap();
    assert_eq!(overviews.len(), 1);
    assert_eq!(overviews[0].id(), "msg2");

    // Matches the message text
    let overviews = db
        .list_messages(FilterMessage::default().with_contains("invoice"))
        .await
        .unwrap();
    assert_eq!(overviews.len(), 1);
    assert_eq!(overviews[0].id(), "msg1");

    // Matches the parent title
    let overviews = db
        .list_messages(FilterMessage::default().with_contains("Billing"))
        .await
        .unwrap();
    assert_eq!(overviews.len(), 2);
}

#[tokio::test]
async fn test_create_analysis_rejects_out_of_range_scores() {
    let db = new_db().await;

    let conversation = Conversation::default()
        .with_id("test_id")
        .with_created_at(chrono::Utc::now());
    db.upsert_conversation(conversation).await.unwrap();

    let analysis = valid_analysis("test_id").with_score(ScoreField::Clarity, 10.1);
    let err = db.create_analysis(analysis).await.unwrap_err();
    let validation = err.downcast_ref::<ValidationError>().unwrap();
    assert_eq!(validation.fields()[0].field, "clarity_score");

    // Nothing was written
    assert!(db.get_analysis("test_id").await.unwrap().is_none());
}

#[tokio::test]
async fn test_create_analysis_accepts_boundary_scores() {
    let db = new_db().await;
    let now = chrono::Utc::now();

    for (convo_id, score) in [("floor_id", 0.0), ("ceiling_id", 10.0)] {
        let conversation = Conversation::default()
            .with_id(convo_id)
            .with_created_at(now);
        db.upsert_conversation(conversation).await.unwrap();

        let mut analysis = valid_analysis(convo_id);
        for field in ScoreField::ALL {
            analysis.set_score(field, score);
        }
        db.create_analysis(analysis).await.unwrap();

        let stored = db.get_analysis(convo_id).await.unwrap().unwrap();
        for field in ScoreField::ALL {
            assert_eq!(stored.score(field), score);
        }
    }
}

#[tokio::test]
async fn test_second_analysis_for_same_conversation_fails() {
    let db = new_db().await;

    let conversation = Conversation::default()
        .with_id("test_id")
        .with_created_at(chrono::Utc::now());
    db.upsert_conversation(conversation).await.unwrap();

    db.create_analysis(valid_analysis("test_id")).await.unwrap();

    // Fresh analysis id, same conversation: unique violation
    let err = db.create_analysis(valid_analysis("test_id")).await;
    assert!(err.is_err());

    let overviews = db.list_analyses(FilterAnalysis::default()).await.unwrap();
    assert_eq!(overviews.len(), 1);
}

#[tokio::test]
async fn test_get_analysis_round_trip() {
    let db = new_db().await;

    let conversation = Conversation::default()
        .with_id("test_id")
        .with_created_at(chrono::Utc::now());
    db.upsert_conversation(conversation).await.unwrap();

    let expected = valid_analysis("test_id").with_avg_response_time(Some(2.4));
    db.create_analysis(expected.clone()).await.unwrap();

    let actual = db.get_analysis("test_id").await.unwrap().unwrap();
    assert_eq!(actual.id(), expected.id());
    assert_eq!(actual.conversation_id(), "test_id");
    assert_eq!(actual.sentiment(), Sentiment::Positive);
    assert_eq!(actual.avg_response_time(), Some(2.4));
    assert!(actual.resolution());
    assert!(!actual.escalation_needed());
    assert_eq!(actual.fallback_frequency(), 0);
    for field in ScoreField::ALL {
        assert_eq!(actual.score(field), expected.score(field));
    }
    assert_eq!(
        actual.created_at().timestamp_millis(),
        expected.created_at().timestamp_millis()
    );
}

#[tokio::test]
async fn test_list_analyses_with_filter() {
    let db = new_db().await;
    let now = chrono::Utc::now();

    for (convo_id, title, sentiment, resolution) in [
        ("happy_id", "Happy Chat", Sentiment::Positive, true),
        ("angry_id", "Angry Chat", Sentiment::Negative, false),
    ] {
        let conversation = Conversation::default()
            .with_id(convo_id)
            .with_title(title)
            .with_created_at(now);
        db.upsert_conversation(conversation).await.unwrap();

        let analysis = valid_analysis(convo_id)
            .with_sentiment(sentiment)
            .with_resolution(resolution)
            .with_escalation_needed(!resolution);
        db.create_analysis(analysis).await.unwrap();
    }

    let overviews = db.list_analyses(FilterAnalysis::default()).await.unwrap();
    assert_eq!(overviews.len(), 2);

    let overviews = db
        .list_analyses(FilterAnalysis::default().with_sentiment(Sentiment::Negative))
        .await
        .unwrap();
    assert_eq!(overviews.len(), 1);
    assert_eq!(overviews[0].conversation_id(), "angry_id");

    let overviews = db
        .list_analyses(FilterAnalysis::default().with_resolution(true))
        .await
        .unwrap();
    assert_eq!(overviews.len(), 1);
    assert_eq!(overviews[0].conversation_id(), "happy_id");

    let overviews = db
        .list_analyses(FilterAnalysis::default().with_escalation_needed(true))
        .await
        .unwrap();
    assert_eq!(overviews.len(), 1);
    assert_eq!(overviews[0].conversation_id(), "angry_id");

    let overviews = db
        .list_analyses(FilterAnalysis::default().with_title("Happy"))
        .await
        .unwrap();
    assert_eq!(overviews.len(), 1);
    assert_eq!(overviews[0].conversation_title(), "Happy Chat");
}

#[tokio::test]
async fn test_update_analysis() {
    let db = new_db().await;

    let conversation = Conversation::default()
        .with_id("test_id")
        .with_created_at(chrono::Utc::now());
    db.upsert_conversation(conversation).await.unwrap();

    let analysis = valid_analysis("test_id");
    db.create_analysis(analysis.clone()).await.unwrap();

    let mut edited = analysis.clone();
    edited.set_score(ScoreField::Overall, 3.0);
    edited.set_sentiment(Sentiment::Negative);
    edited.set_resolution(false);
    edited.set_fallback_frequency(4);
    db.update_analysis(edited).await.unwrap();

    let stored = db.get_analysis("test_id").await.unwrap().unwrap();
    assert_eq!(stored.score(ScoreField::Overall), 3.0);
    assert_eq!(stored.sentiment(), Sentiment::Negative);
    assert!(!stored.resolution());
    assert_eq!(stored.fallback_frequency(), 4);

    // An invalid edit is rejected and leaves the row untouched
    let mut invalid = analysis.clone();
    invalid.set_score(ScoreField::Overall, 12.0);
    let err = db.update_analysis(invalid).await.unwrap_err();
    assert!(err.downcast_ref::<ValidationError>().is_some());

    let stored = db.get_analysis("test_id").await.unwrap().unwrap();
    assert_eq!(stored.score(ScoreField::Overall), 3.0);
}

#[tokio::test]
async fn test_update_unknown_analysis_fails() {
    let db = new_db().await;
    let err = db.update_analysis(valid_analysis("missing_id")).await;
    assert!(err.is_err());
}

#[tokio::test]
async fn test_add_messages_touches_parent_updated_at() {
    let db = new_db().await;
    let created = chrono::Utc::now() - chrono::Duration::hours(1);

    let conversation = Conversation::default()
        .with_id("test_id")
        .with_created_at(created);
    db.upsert_conversation(conversation).await.unwrap();

    let latest = chrono::Utc::now();
    db.add_messages(
        "test_id",
        &[
            Message::new_user("Hi").with_created_at(latest - chrono::Duration::seconds(5)),
            Message::new_ai("Hello").with_created_at(latest),
        ],
    )
    .await
    .unwrap();

    let actual = db.get_conversation("test_id").await.unwrap().unwrap();
    assert_eq!(
        actual.updated_at().timestamp_millis(),
        latest.timestamp_millis()
    );
    assert_eq!(
        actual.created_at().timestamp_millis(),
        created.timestamp_millis()
    );
}
