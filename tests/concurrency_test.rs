//! Concurrent use of one allocator, and of one store from two allocators

mod common;

use common::{scratch_dir, GatedStore};
use delicounter::error::Error;
use delicounter::{
    AllocatorConfig, ItemId, JsonFileStore, MemoryStore, SlotAllocator, SlotStore, Slot, Ticket,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::time::{timeout, Duration};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_adds_get_unique_slots() {
    let counter = Arc::new(SlotAllocator::in_memory(50).expect("valid config"));

    let mut handles = Vec::new();
    for task in 0..8 {
        let counter = Arc::clone(&counter);
        handles.push(tokio::spawn(async move {
            let mut slots = Vec::new();
            for n in 0..10 {
                slots.push(counter.add(format!("session-{}-{}", task, n)).await?);
            }
            Ok::<_, Error>(slots)
        }));
    }

    let mut all: Vec<Slot> = Vec::new();
    for handle in handles {
        all.extend(handle.await.expect("task panicked").expect("add failed"));
    }

    let unique: HashSet<Slot> = all.iter().copied().collect();
    assert_eq!(unique.len(), 80);
    // 50 slots within capacity, the rest extend contiguously past it
    assert_eq!(unique, (1..=80).collect::<HashSet<Slot>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_adds_of_same_item_agree() {
    let counter = Arc::new(SlotAllocator::in_memory(10).expect("valid config"));
    counter.add("warmup").await.unwrap();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let counter = Arc::clone(&counter);
            tokio::spawn(async move { counter.add("shared").await })
        })
        .collect();

    let mut slots = HashSet::new();
    for handle in handles {
        slots.insert(handle.await.unwrap().unwrap());
    }
    assert_eq!(slots, HashSet::from([2]));
    assert_eq!(counter.len().await.unwrap(), 2);
}

#[tokio::test]
async fn test_cancelled_add_leaves_no_ticket() {
    let store = GatedStore::closed(MemoryStore::new());
    let counter = SlotAllocator::new(store.clone(), AllocatorConfig::default()).unwrap();

    // the insert never gets through, so the add times out and is dropped
    let result = timeout(Duration::from_millis(50), counter.add("slow")).await;
    assert!(result.is_err());
    assert_eq!(counter.lookup("slow").await.unwrap(), None);

    // retrying starts over from the store and succeeds
    store.open(1);
    assert_eq!(counter.add("slow").await.unwrap(), 1);
}

#[tokio::test]
async fn test_shared_store_race_is_rejected_not_duplicated() {
    let shared = MemoryStore::new();
    let gated = GatedStore::closed(shared.clone());

    let slow = Arc::new(SlotAllocator::new(gated.clone(), AllocatorConfig::default()).unwrap());
    let fast = SlotAllocator::new(shared.clone(), AllocatorConfig::default()).unwrap();

    // `slow` scans the empty store, picks slot 1, then waits at its insert
    let pending = {
        let slow = Arc::clone(&slow);
        tokio::spawn(async move { slow.add("a").await })
    };
    gated.arrived.notified().await;

    // meanwhile another allocator takes slot 1
    assert_eq!(fast.add("b").await.unwrap(), 1);

    gated.open(2);
    let err = pending.await.unwrap().unwrap_err();
    assert!(matches!(err, Error::SlotTaken(1)));
    assert!(err.is_conflict());

    // the store never held two tickets for one slot; a retry rescans
    assert_eq!(shared.snapshot().len(), 1);
    assert_eq!(slow.add("a").await.unwrap(), 2);
    assert_eq!(
        fast.lookup(ItemId::from("a")).await.unwrap(),
        Some(2)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_separately_opened_file_stores_keep_every_confirmed_ticket() {
    let dir = scratch_dir("file_race");
    let config = AllocatorConfig::default().with_capacity(100);

    let mut tasks = Vec::new();
    for side in ["left", "right"] {
        let store = JsonFileStore::from_config(&dir, &config).await.unwrap();
        let counter = Arc::new(SlotAllocator::new(store, config.clone()).unwrap());
        for n in 0..30 {
            let counter = Arc::clone(&counter);
            let item = format!("{}-{}", side, n);
            tasks.push(tokio::spawn(async move {
                let result = counter.add(item.clone()).await;
                (item, result)
            }));
        }
    }

    let mut confirmed: HashMap<ItemId, Slot> = HashMap::new();
    for task in tasks {
        let (item, result) = task.await.unwrap();
        match result {
            Ok(slot) => {
                confirmed.insert(ItemId::from(item), slot);
            }
            Err(e) => assert!(e.is_conflict(), "unexpected error: {}", e),
        }
    }
    assert!(!confirmed.is_empty());

    let store = JsonFileStore::from_config(&dir, &config).await.unwrap();
    let stored: HashSet<Ticket> = store.list_all().await.unwrap().into_iter().collect();
    for (item, slot) in &confirmed {
        assert!(
            stored.contains(&Ticket::new(item.clone(), *slot)),
            "ticket for {} at slot {} went missing",
            item,
            slot
        );
    }
    assert_eq!(stored.len(), confirmed.len());

    let slots: HashSet<Slot> = stored.iter().map(|t| t.slot).collect();
    assert_eq!(slots.len(), stored.len());

    std::fs::remove_dir_all(dir).ok();
}
