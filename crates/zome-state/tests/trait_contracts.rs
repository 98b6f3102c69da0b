//! Trait contract tests for EntryStore.
//!
//! These tests verify the behavioral contract of the storage trait using the
//! in-memory store. Any conforming implementation must pass these.

use serde_json::json;
use zome_state::fakes::MemoryEntryStore;
use zome_state::storage_traits::*;
use zome_state::{Address, StorageError, ADDRESS_LEN};

fn entry(entry_type: &str, content: serde_json::Value) -> Entry {
    Entry {
        entry_type: entry_type.to_string(),
        content,
    }
}

// ===========================================================================
// Entries
// ===========================================================================

#[tokio::test]
async fn commit_returns_entry_address() {
    let store = MemoryEntryStore::new();
    let e = entry("game_proposal", json!({ "message": "sup" }));
    let address = store.commit_entry(&e).await.unwrap();

    assert_eq!(address, e.address().unwrap());
    assert_eq!(address.as_str().len(), ADDRESS_LEN);
}

#[tokio::test]
async fn get_round_trip() {
    let store = MemoryEntryStore::new();
    let e = entry("game_proposal", json!({ "message": "round trip" }));
    let address = store.commit_entry(&e).await.unwrap();

    assert_eq!(store.get_entry(&address).await.unwrap(), Some(e));
}

#[tokio::test]
async fn get_missing_is_none() {
    let store = MemoryEntryStore::new();
    let bogus = Address::for_content(b"never committed");

    assert_eq!(store.get_entry(&bogus).await.unwrap(), None);
    assert!(!store.contains(&bogus).await.unwrap());
}

#[tokio::test]
async fn commit_deduplicates_same_content() {
    let store = MemoryEntryStore::new();
    let e = entry("anchor", json!("game_proposals"));
    let a1 = store.commit_entry(&e).await.unwrap();
    let a2 = store.commit_entry(&e).await.unwrap();

    assert_eq!(a1, a2);
    assert_eq!(store.entry_count(), 1);
}

// ===========================================================================
// Links
// ===========================================================================

#[tokio::test]
async fn links_preserve_insertion_order() {
    let store = MemoryEntryStore::new();
    let base = store
        .commit_entry(&entry("anchor", json!("game_proposals")))
        .await
        .unwrap();

    let mut expected = Vec::new();
    for message in ["first", "second", "third"] {
        let target = store
            .commit_entry(&entry("game_proposal", json!({ "message": message })))
            .await
            .unwrap();
        store
            .link_entries(Link::new(&base, &target, "has_proposal", ""))
            .await
            .unwrap();
        expected.push(target);
    }

    let targets = store
        .get_links(&base, "has_proposal", LinkMatch::Any)
        .await
        .unwrap();
    assert_eq!(targets, expected);
}

#[tokio::test]
async fn duplicate_link_reported_once() {
    let store = MemoryEntryStore::new();
    let base = store.commit_entry(&entry("anchor", json!("a"))).await.unwrap();
    let target = store.commit_entry(&entry("item", json!(1))).await.unwrap();

    store
        .link_entries(Link::new(&base, &target, "has", ""))
        .await
        .unwrap();
    store
        .link_entries(Link::new(&base, &target, "has", ""))
        .await
        .unwrap();
    store
        .link_entries(Link::new(&base, &target, "has", "other-tag"))
        .await
        .unwrap();

    let targets = store.get_links(&base, "has", LinkMatch::Any).await.unwrap();
    assert_eq!(targets, vec![target]);
    assert_eq!(store.link_count(), 2);
}

#[tokio::test]
async fn link_type_and_tag_filter() {
    let store = MemoryEntryStore::new();
    let base = store.commit_entry(&entry("anchor", json!("a"))).await.unwrap();
    let t1 = store.commit_entry(&entry("item", json!(1))).await.unwrap();
    let t2 = store.commit_entry(&entry("item", json!(2))).await.unwrap();

    store
        .link_entries(Link::new(&base, &t1, "has", "red"))
        .await
        .unwrap();
    store
        .link_entries(Link::new(&base, &t2, "other", "red"))
        .await
        .unwrap();

    let red = store
        .get_links(&base, "has", LinkMatch::Exactly("red".to_string()))
        .await
        .unwrap();
    assert_eq!(red, vec![t1]);

    let blue = store
        .get_links(&base, "has", LinkMatch::Exactly("blue".to_string()))
        .await
        .unwrap();
    assert!(blue.is_empty());
}

#[tokio::test]
async fn link_from_unknown_base_fails() {
    let store = MemoryEntryStore::new();
    let target = store.commit_entry(&entry("item", json!(1))).await.unwrap();
    let bogus = Address::for_content(b"no such base");

    let err = store
        .link_entries(Link::new(&bogus, &target, "has", ""))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound { .. }));
}

#[tokio::test]
async fn load_linked_decodes_targets() {
    #[derive(serde::Deserialize, Debug, PartialEq)]
    struct Item {
        n: u32,
    }

    let store = MemoryEntryStore::new();
    let base = store.commit_entry(&entry("anchor", json!("a"))).await.unwrap();
    for n in [3, 1, 2] {
        let target = store
            .commit_entry(&entry("item", json!({ "n": n })))
            .await
            .unwrap();
        store
            .link_entries(Link::new(&base, &target, "has", ""))
            .await
            .unwrap();
    }

    let items: Vec<Item> = load_linked(&store, &base, "has", LinkMatch::Any)
        .await
        .unwrap();
    assert_eq!(items, vec![Item { n: 3 }, Item { n: 1 }, Item { n: 2 }]);
}
