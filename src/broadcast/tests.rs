use super::*;
use crate::state::EntityState;
use chrono::{Duration, TimeZone, Utc};
use futures::StreamExt;

fn snapshot(seq: i64, alert: bool) -> Snapshot {
    let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap() + Duration::seconds(seq);
    Snapshot {
        taken_at: ts,
        entities: vec![EntityState {
            id: 1,
            name: "North".to_string(),
            alert,
            changed_at: ts,
        }],
    }
}

#[test]
fn test_subscribe_before_any_publish_receives_nothing() {
    let store = SnapshotStore::new();
    let broadcaster = Broadcaster::new();

    let mut sub = broadcaster.subscribe(&store);

    assert!(sub.try_recv().is_none());
    assert_eq!(broadcaster.subscriber_count(), 1);
}

#[test]
fn test_publish_fans_out_in_order() {
    let store = SnapshotStore::new();
    let broadcaster = Broadcaster::new();
    let mut a = broadcaster.subscribe(&store);
    let mut b = broadcaster.subscribe(&store);

    let pushes: Vec<Snapshot> = (0..5).map(|i| snapshot(i, i % 2 == 0)).collect();
    for p in &pushes {
        assert_eq!(broadcaster.publish(&store, p.clone()), 2);
    }

    for sub in [&mut a, &mut b] {
        let received: Vec<Snapshot> = std::iter::from_fn(|| sub.try_recv())
            .map(|s| (*s).clone())
            .collect();
        assert_eq!(received, pushes);
    }
}

#[test]
fn test_late_subscriber_gets_current_only() {
    let store = SnapshotStore::new();
    let broadcaster = Broadcaster::new();
    broadcaster.publish(&store, snapshot(0, false));
    broadcaster.publish(&store, snapshot(1, true));

    let mut late = broadcaster.subscribe(&store);

    assert_eq!(*late.try_recv().unwrap(), snapshot(1, true));
    assert!(late.try_recv().is_none());

    broadcaster.publish(&store, snapshot(2, false));
    assert_eq!(*late.try_recv().unwrap(), snapshot(2, false));
    assert!(late.try_recv().is_none());
}

#[test]
fn test_immediate_delivery_is_not_broadcast_wide() {
    let store = SnapshotStore::new();
    let broadcaster = Broadcaster::new();
    broadcaster.publish(&store, snapshot(0, true));

    let mut first = broadcaster.subscribe(&store);
    assert!(first.try_recv().is_some());

    let _second = broadcaster.subscribe(&store);
    assert!(first.try_recv().is_none());
}

#[test]
fn test_closed_subscriber_is_dropped_lazily() {
    let store = SnapshotStore::new();
    let broadcaster = Broadcaster::new();
    let mut alive = broadcaster.subscribe(&store);

    // A registered sender whose receiver is already gone
    let (tx, rx) = mpsc::unbounded_channel();
    drop(rx);
    broadcaster.subscribers.insert(Uuid::new_v4(), tx);
    assert_eq!(broadcaster.subscriber_count(), 2);

    let delivered = broadcaster.publish(&store, snapshot(0, true));

    assert_eq!(delivered, 1);
    assert_eq!(broadcaster.subscriber_count(), 1);
    assert!(alive.try_recv().is_some());
}

#[test]
fn test_dropping_subscription_unregisters() {
    let store = SnapshotStore::new();
    let broadcaster = Broadcaster::new();

    let sub = broadcaster.subscribe(&store);
    let _other = broadcaster.subscribe(&store);
    assert_eq!(broadcaster.subscriber_count(), 2);

    drop(sub);
    assert_eq!(broadcaster.subscriber_count(), 1);
}

#[test]
fn test_explicit_unsubscribe() {
    let store = SnapshotStore::new();
    let broadcaster = Broadcaster::new();
    let sub = broadcaster.subscribe(&store);
    let id = sub.id();

    assert!(broadcaster.unsubscribe(id));
    assert!(!broadcaster.unsubscribe(id));
    assert_eq!(broadcaster.publish(&store, snapshot(0, true)), 0);

    // Dropping after explicit removal is a no-op
    drop(sub);
    assert_eq!(broadcaster.subscriber_count(), 0);
}

#[tokio::test]
async fn test_subscription_ends_after_unsubscribe() {
    let store = SnapshotStore::new();
    let broadcaster = Broadcaster::new();
    let mut sub = broadcaster.subscribe(&store);

    broadcaster.publish(&store, snapshot(0, true));
    broadcaster.unsubscribe(sub.id());

    // Queued snapshot is still delivered, then the stream ends
    assert!(sub.recv().await.is_some());
    assert!(sub.recv().await.is_none());
}

#[tokio::test]
async fn test_subscription_as_stream() {
    let store = SnapshotStore::new();
    let broadcaster = Arc::new(Broadcaster::new());
    let sub = broadcaster.subscribe(&store);

    for i in 0..3 {
        broadcaster.publish(&store, snapshot(i, i == 1));
    }

    let received: Vec<_> = sub.take(3).collect().await;
    let alerts: Vec<bool> = received.iter().map(|s| s.entities[0].alert).collect();
    assert_eq!(alerts, vec![false, true, false]);
}

#[tokio::test]
async fn test_concurrent_subscribers_during_publishing() {
    let store = Arc::new(SnapshotStore::new());
    let broadcaster = Arc::new(Broadcaster::new());
    let mut handles = vec![];

    for _ in 0..16 {
        let store = Arc::clone(&store);
        let broadcaster = Arc::clone(&broadcaster);
        handles.push(tokio::spawn(async move {
            let mut sub = broadcaster.subscribe(&store);
            let mut last = None;
            while let Some(snap) = sub.recv().await {
                // Never older than what was already seen, never repeated
                if let Some(prev) = last {
                    assert!(snap.taken_at > prev);
                }
                last = Some(snap.taken_at);
                if snap.taken_at == snapshot(49, false).taken_at {
                    break;
                }
            }
            last
        }));
    }

    for i in 0..50 {
        broadcaster.publish(&store, snapshot(i, i % 3 == 0));
        tokio::task::yield_now().await;
    }

    for handle in handles {
        let last = handle.await.unwrap();
        assert_eq!(last, Some(snapshot(49, false).taken_at));
    }
    assert_eq!(broadcaster.subscriber_count(), 0);
}

#[test]
fn test_late_subscriber_gets_published_empty_snapshot() {
    let store = SnapshotStore::new();
    let broadcaster = Broadcaster::new();
    broadcaster.publish(&store, snapshot(0, true));
    let emptied = Snapshot {
        taken_at: snapshot(1, false).taken_at,
        entities: vec![],
    };
    broadcaster.publish(&store, emptied.clone());

    let mut late = broadcaster.subscribe(&store);

    // An emptied source is a real state, delivered like any other
    assert_eq!(*late.try_recv().unwrap(), emptied);
    assert!(late.try_recv().is_none());
}
