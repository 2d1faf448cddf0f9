use std::str::FromStr;

use super::*;

#[test]
fn test_preview_short_text_unmodified() {
    let text = "a".repeat(50);
    let msg = Message::new_user(&text);
    assert_eq!(msg.preview(), text);

    let msg = Message::new_ai("Hello, how can I help?");
    assert_eq!(msg.preview(), "Hello, how can I help?");

    let msg = Message::new_user("");
    assert_eq!(msg.preview(), "");
}

#[test]
fn test_preview_long_text_truncated() {
    let text = "a".repeat(51);
    let msg = Message::new_user(&text);
    assert_eq!(msg.preview(), format!("{}...", "a".repeat(50)));
    assert_eq!(msg.preview().len(), 53);
}

#[test]
fn test_preview_counts_characters_not_bytes() {
    // 51 multibyte characters must still cut at 50 characters
    let text = "é".repeat(51);
    let msg = Message::new_user(&text);
    assert_eq!(msg.preview(), format!("{}...", "é".repeat(50)));
}

#[test]
fn test_sender_round_trip() {
    assert_eq!(Sender::from_str("user").unwrap(), Sender::User);
    assert_eq!(Sender::from_str("ai").unwrap(), Sender::Ai);
    assert_eq!(Sender::User.as_str(), "user");
    assert_eq!(Sender::Ai.as_str(), "ai");
    assert!(Sender::from_str("system").is_err());
}

#[test]
fn test_new_message_assigns_id_and_timestamp() {
    let before = chrono::Utc::now();
    let msg = Message::new_user("Hi");
    assert!(!msg.id().is_empty());
    assert_eq!(msg.sender(), Sender::User);
    assert!(msg.created_at() >= before);
}
