mod common;

use common::MemorySetStore;
use news_relay::store::{JsonSetStore, LinkStore, SetStore, BAD_SET, SEEN_SET};

#[tokio::test]
async fn json_store_round_trips_and_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonSetStore::new(dir.path());

    assert!(store.load(SEEN_SET).await.unwrap().is_empty());

    let entries = vec![
        "https://ex.com/1".to_string(),
        "https://ex.com/2".to_string(),
    ];
    store.save(SEEN_SET, &entries).await.unwrap();

    let loaded = store.load(SEEN_SET).await.unwrap();
    assert_eq!(loaded, entries);
}

#[tokio::test]
async fn mark_seen_persists_and_blocks() {
    let backing = MemorySetStore::new();
    let mut links = LinkStore::load(Box::new(backing.clone())).await.unwrap();

    assert!(!links.is_blocked("https://ex.com/a"));
    links.mark_seen("https://ex.com/a").await.unwrap();

    assert!(links.is_seen("https://ex.com/a"));
    assert!(links.is_blocked("https://ex.com/a"));
    assert_eq!(backing.entries(SEEN_SET), vec!["https://ex.com/a"]);
}

#[tokio::test]
async fn mark_bad_never_touches_seen() {
    let backing = MemorySetStore::new();
    let mut links = LinkStore::load(Box::new(backing.clone())).await.unwrap();

    links.mark_bad("https://ex.com/broken").await.unwrap();

    assert!(links.is_bad("https://ex.com/broken"));
    assert!(!links.is_seen("https://ex.com/broken"));
    assert!(backing.entries(SEEN_SET).is_empty());
    assert_eq!(backing.entries(BAD_SET), vec!["https://ex.com/broken"]);
}

#[tokio::test]
async fn seen_wins_over_bad() {
    // Delivery after a past failure moves the link out of the bad set.
    let backing = MemorySetStore::new();
    let mut links = LinkStore::load(Box::new(backing.clone())).await.unwrap();

    links.mark_bad("https://ex.com/x").await.unwrap();
    links.mark_seen("https://ex.com/x").await.unwrap();

    assert!(links.is_seen("https://ex.com/x"));
    assert!(!links.is_bad("https://ex.com/x"));
    assert!(backing.entries(BAD_SET).is_empty());

    // Marking bad after delivery is a no-op.
    links.mark_bad("https://ex.com/x").await.unwrap();
    assert!(!links.is_bad("https://ex.com/x"));
}

#[tokio::test]
async fn inconsistent_persisted_state_resolves_to_seen() {
    let backing = MemorySetStore::new();
    backing.seed(SEEN_SET, &["https://ex.com/both"]);
    backing.seed(BAD_SET, &["https://ex.com/both", "https://ex.com/onlybad"]);

    let links = LinkStore::load(Box::new(backing.clone())).await.unwrap();

    assert!(links.is_seen("https://ex.com/both"));
    assert!(!links.is_bad("https://ex.com/both"));
    assert!(links.is_bad("https://ex.com/onlybad"));
}

#[tokio::test]
async fn prune_drops_oldest_entries_only() {
    let backing = MemorySetStore::new();
    let mut links = LinkStore::load(Box::new(backing.clone())).await.unwrap();

    for i in 0..5 {
        links.mark_seen(&format!("https://ex.com/{}", i)).await.unwrap();
    }

    links.prune_seen(2).await.unwrap();

    assert_eq!(links.seen_len(), 2);
    assert!(!links.is_seen("https://ex.com/0"));
    assert!(!links.is_seen("https://ex.com/2"));
    assert!(links.is_seen("https://ex.com/3"));
    assert!(links.is_seen("https://ex.com/4"));
    assert_eq!(
        backing.entries(SEEN_SET),
        vec!["https://ex.com/3", "https://ex.com/4"]
    );
}
