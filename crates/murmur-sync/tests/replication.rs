//! Replication protocol tests
//!
//! Every test runs its peers over a private `MemoryHub` so tests in this
//! binary never see each other's traffic.

use murmur_core::{decode_message, encode_message, ParticipantId, PeerId, SyncMessage, Version};
use murmur_sync::{SyncConfig, SyncContext};
use murmur_testkit::{init_tracing, settle, spawn_peers, wait_until, NotifyCounter, DEFAULT_TIMEOUT};
use murmur_transport::{ChannelTransport, MemoryHub};
use serde::{Deserialize, Serialize};

// ============================================================================
// Convergence
// ============================================================================

#[tokio::test]
async fn three_peers_follow_each_write() {
    init_tracing();
    let group = spawn_peers::<String>("test1", 3).unwrap();
    let (a, b, c) = (&group.peers[0], &group.peers[1], &group.peers[2]);

    a.set_state("hello".to_string()).unwrap();
    assert!(wait_until(DEFAULT_TIMEOUT, || group.all_hold(&"hello".to_string())).await);
    assert_eq!(b.get_state().as_deref(), Some("hello"));
    assert_eq!(c.get_state().as_deref(), Some("hello"));

    b.set_state("hello world".to_string()).unwrap();
    assert!(wait_until(DEFAULT_TIMEOUT, || group.all_hold(&"hello world".to_string())).await);
    assert_eq!(a.get_snapshot().as_deref(), Some("hello world"));
    assert_eq!(c.get_snapshot().as_deref(), Some("hello world"));
    assert!(group.versions_agree());
}

#[tokio::test]
async fn structured_values_replicate() {
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Cursor {
        line: u32,
        column: u32,
        file: String,
    }

    let group = spawn_peers::<Cursor>("cursor", 2).unwrap();
    let value = Cursor {
        line: 12,
        column: 4,
        file: "main.rs".to_string(),
    };

    group.peers[1].set_state(value.clone()).unwrap();
    assert!(wait_until(DEFAULT_TIMEOUT, || group.all_hold(&value)).await);
}

#[tokio::test]
async fn same_value_written_twice_produces_two_versions() {
    let group = spawn_peers::<u32>("repeat", 2).unwrap();
    let counter = NotifyCounter::new();
    group.peers[1].subscribe(counter.observer()).detach();

    let first = group.peers[0].set_state(7).unwrap();
    assert!(wait_until(DEFAULT_TIMEOUT, || counter.count() == 1).await);

    let second = group.peers[0].set_state(7).unwrap();
    assert_ne!(first, second);
    assert!(wait_until(DEFAULT_TIMEOUT, || counter.count() == 2).await);
    assert_eq!(group.peers[1].version(), second);
}

#[tokio::test]
async fn concurrent_writers_resolve_by_delivery_order() {
    let group = spawn_peers::<String>("race", 3).unwrap();
    let (a, b, c) = (&group.peers[0], &group.peers[1], &group.peers[2]);
    settle().await;

    // Neither write has been delivered when the other one happens.
    a.set_state("from a".to_string()).unwrap();
    b.set_state("from b".to_string()).unwrap();
    settle().await;

    // Each peer keeps whichever differing update reached it last.
    assert_eq!(a.get_state().as_deref(), Some("from b"));
    assert_eq!(b.get_state().as_deref(), Some("from a"));
    assert_eq!(c.get_state().as_deref(), Some("from b"));
}

// ============================================================================
// Late joiners
// ============================================================================

#[tokio::test]
async fn late_joiner_catches_up_without_writing() {
    let mut group = spawn_peers::<String>("late", 2).unwrap();
    group.peers[0].set_state("current".to_string()).unwrap();
    assert!(wait_until(DEFAULT_TIMEOUT, || group.all_hold(&"current".to_string())).await);

    let late = group.join_late("late").unwrap();
    assert!(wait_until(DEFAULT_TIMEOUT, || late.get_state().as_deref() == Some("current")).await);
    assert_eq!(late.version(), group.peers[0].version());
    assert_eq!(late.stats().frames_sent, 1);
}

#[tokio::test]
async fn peers_without_state_stay_quiet_on_hi() {
    let mut group = spawn_peers::<u32>("quiet", 2).unwrap();
    let late = group.join_late("quiet").unwrap();
    settle().await;

    assert_eq!(late.get_state(), None);
    assert!(late.version().is_initial());
    for peer in &group.peers {
        // Only the initial `hi` went out.
        assert_eq!(peer.stats().frames_sent, 1);
    }
}

#[tokio::test]
async fn seeded_initial_value_is_not_announced() {
    let ctx = SyncContext::new(MemoryHub::new());
    let seeded = ctx.join("seeded", Some(10u32)).unwrap();
    let newcomer = ctx.join::<u32>("seeded", None).unwrap();
    settle().await;

    assert_eq!(seeded.get_state(), Some(10));
    assert_eq!(newcomer.get_state(), None);
}

#[tokio::test]
async fn late_joiner_stays_stale_when_answers_are_disabled() {
    let ctx = SyncContext::new(MemoryHub::new()).with_config(SyncConfig {
        answer_announcements: false,
        ..Default::default()
    });
    let writer = ctx.join::<u32>("mute", None).unwrap();
    writer.set_state(5).unwrap();

    let late = ctx.join::<u32>("mute", None).unwrap();
    settle().await;
    assert_eq!(writer.stats().hi_received, 1);
    assert_eq!(late.get_state(), None);
}

// ============================================================================
// Idempotence and self-exclusion
// ============================================================================

#[tokio::test]
async fn repeated_update_notifies_once() {
    let hub = MemoryHub::new();
    let ctx = SyncContext::new(hub.clone());
    let peer = ctx.join::<String>("dup", None).unwrap();
    let counter = NotifyCounter::new();
    peer.subscribe(counter.observer()).detach();

    let (raw, _inbox) = hub.join(peer.channel_name()).unwrap().split();
    let frame = encode_message(&SyncMessage::update(
        ParticipantId::from_raw(99),
        Version::from("v-1"),
        "once".to_string(),
    ))
    .unwrap();
    raw.send(frame.clone()).unwrap();
    raw.send(frame).unwrap();
    settle().await;

    assert_eq!(counter.count(), 1);
    let stats = peer.stats();
    assert_eq!(stats.updates_applied, 1);
    assert_eq!(stats.updates_ignored, 1);
}

#[tokio::test]
async fn re_announcements_do_not_renotify() {
    let mut group = spawn_peers::<u32>("reannounce", 3).unwrap();
    let counter = NotifyCounter::new();
    group.peers[2].subscribe(counter.observer()).detach();

    group.peers[0].set_state(1).unwrap();
    assert!(wait_until(DEFAULT_TIMEOUT, || group.all_hold(&1)).await);
    assert_eq!(counter.count(), 1);

    // Every peer with state answers the newcomer; the others already hold it.
    let late = group.join_late("reannounce").unwrap();
    assert!(wait_until(DEFAULT_TIMEOUT, || late.get_state() == Some(1)).await);
    settle().await;

    assert_eq!(counter.count(), 1);
    assert!(group.peers[2].stats().updates_ignored >= 1);
}

#[tokio::test]
async fn own_writes_notify_only_once() {
    let group = spawn_peers::<u32>("self", 2).unwrap();
    let counter = NotifyCounter::new();
    group.peers[0].subscribe(counter.observer()).detach();

    group.peers[0].set_state(3).unwrap();
    assert_eq!(counter.count(), 1);
    settle().await;

    assert_eq!(counter.count(), 1);
    let stats = group.peers[0].stats();
    assert_eq!(stats.updates_applied, 0);
    assert_eq!(stats.updates_ignored, 0);
}

#[tokio::test]
async fn unsubscribed_observer_is_not_called() {
    let group = spawn_peers::<u32>("unsub", 2).unwrap();
    let counter = NotifyCounter::new();
    let subscription = group.peers[1].subscribe(counter.observer());

    group.peers[0].set_state(1).unwrap();
    assert!(wait_until(DEFAULT_TIMEOUT, || counter.count() == 1).await);

    subscription.unsubscribe();
    group.peers[0].set_state(2).unwrap();
    assert!(wait_until(DEFAULT_TIMEOUT, || group.all_hold(&2)).await);
    assert_eq!(counter.count(), 1);
}

// ============================================================================
// Isolation
// ============================================================================

#[tokio::test]
async fn different_channels_never_mix() {
    let ctx = SyncContext::new(MemoryHub::new());
    let red = ctx.join::<u32>("red", None).unwrap();
    let blue = ctx.join::<u32>("blue", None).unwrap();

    red.set_state(1).unwrap();
    settle().await;

    assert_eq!(blue.get_state(), None);
    assert_eq!(blue.stats().hi_received, 0);
}

#[tokio::test]
async fn separate_hubs_never_mix() {
    let left = SyncContext::new(MemoryHub::new());
    let right = SyncContext::new(MemoryHub::new());
    let a = left.join::<u32>("same-name", None).unwrap();
    let b = right.join::<u32>("same-name", None).unwrap();

    a.set_state(1).unwrap();
    settle().await;
    assert_eq!(b.get_state(), None);
}

// ============================================================================
// Malformed input and failing observers
// ============================================================================

#[tokio::test]
async fn malformed_frames_are_dropped_and_loop_survives() {
    let hub = MemoryHub::new();
    let ctx = SyncContext::new(hub.clone());
    let peer = ctx.join::<u32>("noise", None).unwrap();
    let (raw, _inbox) = hub.join(peer.channel_name()).unwrap().split();

    let garbage: [&[u8]; 5] = [
        b"\x00\x01\x02",
        br#"{"kind":"update","targetId":"1","snapshot":4}"#,
        br#"{"kind":"update","targetId":"1","hash":"v","snapshot":"four"}"#,
        br#"{"kind":"wave","targetId":"1"}"#,
        br#"{"kind":"update","targetId":"1","hash":"0","snapshot":4}"#,
    ];
    for frame in garbage {
        raw.send(frame.to_vec()).unwrap();
    }
    settle().await;

    assert_eq!(peer.get_state(), None);
    assert_eq!(peer.stats().malformed_dropped, 5);
    assert!(peer.is_active());

    raw.send(br#"{"kind":"update","targetId":"1","hash":"v","snapshot":4}"#.to_vec())
        .unwrap();
    assert!(wait_until(DEFAULT_TIMEOUT, || peer.get_state() == Some(4)).await);
}

#[tokio::test]
async fn oversized_frames_are_dropped() {
    let hub = MemoryHub::new();
    let ctx = SyncContext::new(hub.clone()).with_config(SyncConfig {
        max_frame_bytes: 64,
        ..Default::default()
    });
    let peer = ctx.join::<String>("big", None).unwrap();
    let (raw, _inbox) = hub.join(peer.channel_name()).unwrap().split();

    let frame = encode_message(&SyncMessage::update(
        ParticipantId::from_raw(5),
        Version::fresh(),
        "x".repeat(128),
    ))
    .unwrap();
    raw.send(frame).unwrap();
    settle().await;

    assert_eq!(peer.get_state(), None);
    assert_eq!(peer.stats().malformed_dropped, 1);
}

#[tokio::test]
async fn sender_ids_from_other_implementations_are_accepted() {
    let hub = MemoryHub::new();
    let ctx = SyncContext::new(hub.clone());
    let peer = ctx.join::<u32>("foreign", None).unwrap();
    let (raw, mut inbox) = hub.join(peer.channel_name()).unwrap().split();

    raw.send(br#"{"kind":"update","targetId":"tab-7f3a","hash":"v1","snapshot":4}"#.to_vec())
        .unwrap();
    assert!(wait_until(DEFAULT_TIMEOUT, || peer.get_state() == Some(4)).await);

    raw.send(br#"{"kind":"hi","targetId":"peer-x"}"#.to_vec())
        .unwrap();
    let answer = tokio::time::timeout(DEFAULT_TIMEOUT, inbox.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        decode_message::<u32>(&answer).unwrap(),
        SyncMessage::update(PeerId::from(peer.target_id()), Version::from("v1"), 4)
    );

    let stats = peer.stats();
    assert_eq!(stats.hi_received, 1);
    assert_eq!(stats.updates_applied, 1);
    assert_eq!(stats.malformed_dropped, 0);
}

#[tokio::test]
async fn panicking_observer_does_not_stop_replication() {
    let group = spawn_peers::<u32>("panic", 2).unwrap();
    let counter = NotifyCounter::new();
    group.peers[1].subscribe(|| panic!("bad observer")).detach();
    group.peers[1].subscribe(counter.observer()).detach();

    group.peers[0].set_state(1).unwrap();
    assert!(wait_until(DEFAULT_TIMEOUT, || counter.count() == 1).await);

    group.peers[0].set_state(2).unwrap();
    assert!(wait_until(DEFAULT_TIMEOUT, || counter.count() == 2).await);
    assert_eq!(group.peers[1].get_state(), Some(2));
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn dropping_a_peer_leaves_the_channel() {
    let mut group = spawn_peers::<u32>("leave", 2).unwrap();
    let channel = group.peers[0].channel_name().clone();
    assert_eq!(group.hub.member_count(&channel), 2);

    group.peers.pop();
    settle().await;
    assert_eq!(group.hub.member_count(&channel), 1);

    // Sending into a channel with no other members is fine.
    group.peers[0].set_state(1).unwrap();
}

#[tokio::test]
async fn closed_peer_stops_following() {
    let group = spawn_peers::<u32>("closed", 2).unwrap();
    group.peers[1].close();
    settle().await;

    group.peers[0].set_state(9).unwrap();
    settle().await;

    assert_eq!(group.peers[1].get_state(), None);
    // Local writes still work after close.
    group.peers[1].set_state(1).unwrap();
    assert_eq!(group.peers[1].get_state(), Some(1));
}
