//! Notification feed over HTTP

use std::sync::Arc;

use loan_desk::state::NotificationFeed;

use crate::support::{spawn, Backend};

#[tokio::test]
async fn test_feed_pages_and_mark_read() {
    let backend = spawn(Backend::seeded(0, 12)).await;
    let services = backend.signed_in("admin").await;
    let feed = NotificationFeed::new(Arc::clone(&services.notifications));

    assert_eq!(feed.refresh_unread_count().await.unwrap(), 12);

    feed.load_page(1).await.unwrap();
    assert_eq!(feed.snapshot().await.items.len(), 10);
    assert!(feed.has_more().await);

    assert!(feed.load_more().await.unwrap());
    let snapshot = feed.snapshot().await;
    assert_eq!(snapshot.items.len(), 12);
    assert!(!snapshot.has_more);

    assert!(feed.mark_read(3).await.unwrap());
    assert_eq!(feed.unread_count().await, 11);
    assert!(!feed.mark_read(3).await.unwrap());

    // The backend agrees once the counter is refreshed
    assert_eq!(feed.refresh_unread_count().await.unwrap(), 11);
    let stored = backend.state.lock().unwrap().notifications[2].clone();
    assert!(stored.is_read);
    assert!(stored.read_at.is_some());
}

#[tokio::test]
async fn test_feed_requires_session() {
    let backend = spawn(Backend::seeded(0, 3)).await;
    let (services, _) = backend.client();
    let feed = NotificationFeed::new(Arc::clone(&services.notifications));

    let err = feed.load_page(1).await.unwrap_err();
    assert_eq!(err.user_message(), "You must sign in to continue");
    assert!(feed.snapshot().await.items.is_empty());
}
