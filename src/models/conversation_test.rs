use super::*;
use crate::config::constants::TITLE_PLACEHOLDER;

#[test]
fn test_default_conversation() {
    let convo = Conversation::default();
    assert!(!convo.id().is_empty());
    assert_eq!(convo.title(), TITLE_PLACEHOLDER);
    assert_eq!(convo.message_count(), 0);
    assert!(!convo.has_analysis());
    // updated_at falls back to created_at until something changes
    assert_eq!(convo.updated_at(), convo.created_at());
}

#[test]
fn test_with_messages_sorts_by_created_at() {
    let now = chrono::Utc::now();
    let first = Message::new_user("Hi").with_created_at(now - chrono::Duration::seconds(20));
    let second = Message::new_ai("Hello, how can I help?")
        .with_created_at(now - chrono::Duration::seconds(10));
    let third = Message::new_user("Thanks").with_created_at(now);

    // Insert out of order
    let convo = Conversation::default()
        .with_messages(vec![third.clone(), first.clone(), second.clone()]);

    let ids: Vec<&str> = convo.messages().iter().map(|m| m.id()).collect();
    assert_eq!(ids, vec![first.id(), second.id(), third.id()]);
}

#[test]
fn test_append_message_keeps_order_and_touches_updated_at() {
    let now = chrono::Utc::now();
    let mut convo =
        Conversation::default().with_created_at(now - chrono::Duration::seconds(60));

    let earlier = Message::new_user("first").with_created_at(now - chrono::Duration::seconds(30));
    let later = Message::new_ai("second").with_created_at(now);

    convo.append_message(later.clone());
    convo.append_message(earlier.clone());

    let ids: Vec<&str> = convo.messages().iter().map(|m| m.id()).collect();
    assert_eq!(ids, vec![earlier.id(), later.id()]);
    assert_eq!(convo.message_count(), 2);
    assert!(convo.updated_at() > convo.created_at());
}

#[test]
fn test_has_analysis() {
    let convo = Conversation::default();
    let analysis = crate::models::ConversationAnalysis::new(convo.id());
    let convo = convo.with_analysis(Some(analysis));
    assert!(convo.has_analysis());
    assert_eq!(
        convo.analysis().unwrap().conversation_id(),
        convo.id()
    );
}
