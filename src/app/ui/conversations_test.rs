use std::sync::Arc;

use tokio::sync::mpsc;

use super::*;
use crate::storage::MockStorage;

fn fake_rows() -> Vec<ConversationOverview> {
    let now = chrono::Utc::now();
    vec![
        ConversationOverview::new("id_new", "Support Chat", now, now)
            .with_message_count(2)
            .with_has_analysis(true),
        ConversationOverview::new(
            "id_old",
            "Old Chat",
            now - chrono::Duration::days(3),
            now - chrono::Duration::days(3),
        ),
    ]
}

fn new_screen(storage: ArcStorage) -> ConversationsScreen<'static> {
    let (event_tx, _event_rx) = mpsc::unbounded_channel::<Event>();
    ConversationsScreen::new(event_tx, storage)
}

#[tokio::test]
async fn test_reload_fetches_rows() {
    let mut mock = MockStorage::new();
    mock.expect_list_conversations()
        .withf(|filter| filter.title().is_none() && filter.created_from().is_none())
        .returning(|_| Ok(fake_rows()));

    let mut screen = new_screen(Arc::new(mock));
    assert!(!screen.loaded());

    screen.reload().await;
    assert!(screen.loaded());
    assert_eq!(screen.rows.len(), 2);
}

#[tokio::test]
async fn test_reload_passes_search_term() {
    let mut mock = MockStorage::new();
    mock.expect_list_conversations()
        .withf(|filter| filter.title() == Some("Support"))
        .returning(|_| Ok(vec![fake_rows().remove(0)]));

    let mut screen = new_screen(Arc::new(mock));
    screen.search_term = "Support".to_string();
    screen.reload().await;

    assert_eq!(screen.rows.len(), 1);
    assert_eq!(screen.rows[0].id(), "id_new");
}

#[tokio::test]
async fn test_build_list_items_groups_and_maps_rows() {
    let screen = new_screen(Arc::new(MockStorage::new()));
    let mut screen = screen.with_conversations(fake_rows());

    screen.build_list_items(80);

    // Two group headers (Today, Last 7 Days) plus two rows
    assert_eq!(screen.list_items.len(), 4);
    assert_eq!(screen.id_map.len(), 2);
    assert_eq!(screen.id_map.get(&1).map(String::as_str), Some("id_new"));
    assert_eq!(screen.id_map.get(&3).map(String::as_str), Some("id_old"));
}

#[tokio::test]
async fn test_navigation_skips_group_headers() {
    let screen = new_screen(Arc::new(MockStorage::new()));
    let mut screen = screen.with_conversations(fake_rows());
    screen.build_list_items(80);

    screen.first();
    assert_eq!(screen.list_state.selected(), Some(1));
    assert_eq!(screen.selected_id(), Some("id_new"));

    // Moving down lands on the next row, not the header between them
    screen.next_row();
    assert_eq!(screen.selected_id(), Some("id_old"));

    screen.prev_row();
    screen.prev_row();
    assert_eq!(screen.selected_id(), Some("id_new"));
}

#[tokio::test]
async fn test_build_list_items_empty() {
    let screen = new_screen(Arc::new(MockStorage::new()));
    let mut screen = screen.with_conversations(vec![]);
    screen.build_list_items(80);

    assert_eq!(screen.list_items.len(), 1);
    assert!(screen.id_map.is_empty());
    assert_eq!(screen.selected_id(), None);
}
