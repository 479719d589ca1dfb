//! Store failures propagate to the caller and leave no partial state

mod common;

use common::{FailingStore, Op};
use delicounter::error::Error;
use delicounter::{ActiveSet, AllocatorConfig, SlotAllocator, Ticket};

fn counter(store: &FailingStore, capacity: u64) -> SlotAllocator {
    SlotAllocator::new(
        store.clone(),
        AllocatorConfig::default().with_capacity(capacity),
    )
    .expect("valid config")
}

#[tokio::test]
async fn test_add_propagates_lookup_failure() {
    let store = FailingStore::new();
    let counter = counter(&store, 3);

    store.fail(Op::Find);
    assert!(matches!(counter.add("a").await, Err(Error::Storage(_))));

    store.heal();
    assert_eq!(counter.add("a").await.unwrap(), 1);
}

#[tokio::test]
async fn test_add_propagates_insert_failure() {
    let store = FailingStore::new();
    let counter = counter(&store, 3);

    store.fail(Op::Insert);
    let err = counter.add("a").await.unwrap_err();
    assert!(err.to_string().contains("injected failure on Insert"));
    assert!(store.inner.is_empty());

    store.heal();
    assert_eq!(counter.add("a").await.unwrap(), 1);
}

#[tokio::test]
async fn test_reclaim_delete_failure_aborts_add() {
    let store = FailingStore::new();
    let active: ActiveSet = ["keep"].into_iter().collect();
    let counter = counter(&store, 2).with_oracle(active);

    counter.add("keep").await.unwrap();
    counter.add("stale").await.unwrap();

    store.fail(Op::DeleteNotIn);
    assert!(matches!(counter.add("new").await, Err(Error::Storage(_))));
    assert_eq!(
        store.inner.snapshot(),
        vec![Ticket::new("keep", 1), Ticket::new("stale", 2)]
    );

    store.heal();
    assert_eq!(counter.add("new").await.unwrap(), 2);
}

#[tokio::test]
async fn test_remove_and_reset_propagate_failures() {
    let store = FailingStore::new();
    let counter = counter(&store, 3);
    counter.add("a").await.unwrap();

    store.fail(Op::Delete);
    assert!(matches!(counter.remove("a").await, Err(Error::Storage(_))));

    store.fail(Op::Clear);
    assert!(matches!(counter.reset().await, Err(Error::Storage(_))));

    store.heal();
    assert!(counter.remove("a").await.unwrap());
    counter.reset().await.unwrap();
}

#[tokio::test]
async fn test_list_and_count_failures() {
    let store = FailingStore::new();
    let counter = counter(&store, 3);

    store.fail(Op::List);
    assert!(counter.tickets().await.is_err());
    assert!(counter.add("a").await.is_err());

    store.fail(Op::Count);
    assert!(counter.len().await.is_err());
}
