// ABOUTME: Tests for the in-process lock store.
// ABOUTME: Covers conditional set/delete semantics and lazy TTL expiry.

use std::time::Duration;

use super::{LockStore, MemoryStore};

#[tokio::test]
async fn test_set_if_absent_first_wins() {
    let store = MemoryStore::new();
    let ttl = Duration::from_secs(30);

    assert!(store.set_if_absent("k", "owner-a", ttl).await.unwrap());
    assert!(!store.set_if_absent("k", "owner-b", ttl).await.unwrap());
}

#[tokio::test]
async fn test_compare_and_delete_requires_owner_match() {
    let store = MemoryStore::new();
    store
        .set_if_absent("k", "owner-a", Duration::from_secs(30))
        .await
        .unwrap();

    // Foreign owner cannot delete
    assert!(!store.compare_and_delete("k", "owner-b").await.unwrap());
    assert!(
        !store
            .set_if_absent("k", "x", Duration::from_secs(30))
            .await
            .unwrap()
    );

    // Rightful owner can
    assert!(store.compare_and_delete("k", "owner-a").await.unwrap());
    assert!(
        store
            .set_if_absent("k", "owner-b", Duration::from_secs(30))
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_expired_key_counts_as_absent() {
    let store = MemoryStore::new();
    store
        .set_if_absent("k", "owner-a", Duration::from_millis(20))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(40)).await;

    // A new owner can claim the key after expiry
    assert!(
        store
            .set_if_absent("k", "owner-b", Duration::from_secs(30))
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_compare_and_delete_on_expired_key_fails() {
    let store = MemoryStore::new();
    store
        .set_if_absent("k", "owner-a", Duration::from_millis(20))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(40)).await;

    // The holder's token no longer matches anything live
    assert!(!store.compare_and_delete("k", "owner-a").await.unwrap());
}

#[tokio::test]
async fn test_ttl_remaining_counts_down() {
    let store = MemoryStore::new();
    store
        .set_if_absent("k", "v", Duration::from_secs(30))
        .await
        .unwrap();

    let remaining = store.ttl_remaining("k").await.unwrap().unwrap();
    assert!(remaining <= Duration::from_secs(30));
    assert!(remaining > Duration::from_secs(29));

    assert!(store.ttl_remaining("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_keys_filters_by_prefix_and_skips_expired() {
    let store = MemoryStore::new();
    let ttl = Duration::from_secs(30);
    store.set_if_absent("lead:a", "v", ttl).await.unwrap();
    store.set_if_absent("lead:b", "v", ttl).await.unwrap();
    store.set_if_absent("other:c", "v", ttl).await.unwrap();
    store
        .set_if_absent("lead:expired", "v", Duration::from_millis(10))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(30)).await;

    let mut keys = store.list_keys("lead:").await.unwrap();
    keys.sort();
    assert_eq!(keys, vec!["lead:a".to_string(), "lead:b".to_string()]);
}

#[tokio::test]
async fn test_remove_is_unconditional() {
    let store = MemoryStore::new();
    store
        .set_if_absent("k", "owner-a", Duration::from_secs(30))
        .await
        .unwrap();

    assert!(store.remove("k").await.unwrap());
    assert!(!store.remove("k").await.unwrap());
}
