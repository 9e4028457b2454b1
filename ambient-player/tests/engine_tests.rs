//! Playback engine scenario tests
//!
//! Drive the engine directly with scripted slots and a paused tokio clock:
//! crossfade arming and completion, aborts, manual navigation, volume and
//! playlist load failures.

mod helpers;

use ambient_common::events::TransitionVia;
use ambient_common::{PlayerEvent, PlayerStatus};
use ambient_player::playback::{PlayRejection, SlotId, TransitionState};
use ambient_player::Error;
use helpers::*;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{advance, Instant};

fn drain(rx: &mut broadcast::Receiver<PlayerEvent>) -> Vec<PlayerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

async fn loaded(n: usize) -> Harness {
    let mut h = Harness::new(tracks(n));
    h.engine.load_playlist(None).await.unwrap();
    h
}

// ============================================================================
// Loading
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_load_starts_first_track_on_slot_a() {
    let h = loaded(3).await;

    let snapshot = h.engine.snapshot();
    assert_eq!(snapshot.status, PlayerStatus::Ready);
    assert_eq!(snapshot.playlist.as_deref(), Some(PLAYLIST));
    assert_eq!(snapshot.index, 0);
    assert_eq!(snapshot.total, 3);
    assert_eq!(snapshot.track_id.as_deref(), Some("t1"));
    assert!(snapshot.is_playing);

    assert_eq!(h.engine.active_slot(), SlotId::A);
    assert_eq!(h.a.last_load().as_deref(), Some("t1.mp3"));
    assert!(h.a.is_playing());
    assert!(!h.b.is_playing());
    assert_eq!(h.a.gain(), 1.0);
    assert_eq!(h.b.gain(), 0.0);
}

#[tokio::test(start_paused = true)]
async fn test_empty_playlist_reports_error() {
    let mut h = Harness::new(vec![track_in("other", "x", 1)]);

    let result = h.engine.load_playlist(Some("empty".to_string())).await;
    assert!(matches!(result, Err(Error::EmptyQueue { ref playlist }) if playlist == "empty"));

    let snapshot = h.engine.snapshot();
    assert_eq!(snapshot.status, PlayerStatus::Error);
    assert!(snapshot.error_message.as_deref().unwrap_or("").contains("empty"));
    assert!(!snapshot.is_playing);
    assert_eq!(snapshot.total, 0);
    assert!(!h.a.is_playing());
}

#[tokio::test(start_paused = true)]
async fn test_inactive_tracks_are_skipped() {
    let mut only_inactive = track("t1", 1);
    only_inactive.active = false;
    let mut h = Harness::new(vec![only_inactive]);

    let result = h.engine.load_playlist(None).await;
    assert!(matches!(result, Err(Error::EmptyQueue { .. })));
}

#[tokio::test(start_paused = true)]
async fn test_catalog_failure_then_recovery() {
    let mut h = Harness::new(tracks(2));
    h.catalog.set_failing(true);

    let result = h.engine.load_playlist(None).await;
    assert!(matches!(result, Err(Error::CatalogFetchFailed(_))));
    let snapshot = h.engine.snapshot();
    assert_eq!(snapshot.status, PlayerStatus::Error);
    assert!(snapshot
        .error_message
        .as_deref()
        .unwrap_or("")
        .contains("could not load tracks"));

    h.catalog.set_failing(false);
    h.engine.load_playlist(None).await.unwrap();
    assert_eq!(h.engine.status(), PlayerStatus::Ready);

    // The failed load cleared the play intent
    assert!(!h.engine.is_playing());
    assert!(!h.a.is_playing());

    h.engine.play_pause().await.unwrap();
    assert!(h.engine.is_playing());
    assert!(h.a.is_playing());
}

#[tokio::test(start_paused = true)]
async fn test_autoplay_rejection_leaves_player_ready_and_paused() {
    let mut h = Harness::new(tracks(2));
    h.a.reject_next_play(PlayRejection::GestureRequired);
    let mut rx = h.events.subscribe();

    h.engine.load_playlist(None).await.unwrap();

    assert_eq!(h.engine.status(), PlayerStatus::Ready);
    assert!(!h.engine.is_playing());
    assert!(drain(&mut rx)
        .iter()
        .any(|e| matches!(e, PlayerEvent::PlaybackRejected { .. })));

    h.engine.play_pause().await.unwrap();
    assert!(h.engine.is_playing());
    assert!(h.a.is_playing());
}

#[tokio::test(start_paused = true)]
async fn test_intents_refused_before_load() {
    let mut h = Harness::new(tracks(2));
    assert!(matches!(
        h.engine.next().await,
        Err(Error::NotReady(PlayerStatus::Loading))
    ));
    assert!(matches!(
        h.engine.play_pause().await,
        Err(Error::NotReady(_))
    ));
}

// ============================================================================
// Crossfade
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_crossfade_arms_inside_window_and_swaps_on_track_end() {
    // T1 is 5s, T2 is 4s, window is 2s
    let mut h = loaded(2).await;
    let mut rx = h.events.subscribe();

    let early = h.progress(SlotId::A, 2900, 5000);
    h.engine.handle_slot_event(early).await.unwrap();
    assert_eq!(*h.engine.transition_state(), TransitionState::Idle);
    assert_eq!(h.b.plays(), 0);

    let armed = h.progress(SlotId::A, 3100, 5000);
    h.engine.handle_slot_event(armed).await.unwrap();
    assert!(matches!(
        h.engine.transition_state(),
        TransitionState::InFlight(fade) if fade.next_index == 1 && fade.incoming == SlotId::B
    ));
    assert_eq!(h.b.last_load().as_deref(), Some("t2.mp3"));
    assert!(h.b.is_playing());
    assert_eq!(h.engine.current_index(), 0);
    assert_eq!(h.engine.active_slot(), SlotId::A);

    advance(Duration::from_millis(1900)).await;
    let ended = h.ended(SlotId::A);
    h.engine.handle_slot_event(ended).await.unwrap();

    assert_eq!(h.engine.active_slot(), SlotId::B);
    assert_eq!(h.engine.current_index(), 1);
    assert_eq!(*h.engine.transition_state(), TransitionState::Idle);
    assert!(!h.a.is_playing());
    assert!(h.b.is_playing());
    assert_eq!(h.b.gain(), 1.0);
    assert_eq!(h.a.gain(), 0.0);

    let events = drain(&mut rx);
    assert!(events
        .iter()
        .any(|e| matches!(e, PlayerEvent::CrossfadeStarted { from_index: 0, to_index: 1, .. })));
    assert!(events.iter().any(|e| matches!(
        e,
        PlayerEvent::TrackStarted { index: 1, via: TransitionVia::Crossfade, .. }
    )));
}

#[tokio::test(start_paused = true)]
async fn test_crossfade_completes_at_deadline() {
    let mut h = loaded(3).await;
    let started = Instant::now();

    let armed = h.progress(SlotId::A, 3100, 5000);
    h.engine.handle_slot_event(armed).await.unwrap();

    let deadline = h.engine.deadline().expect("crossfade in flight");
    assert_eq!(deadline - started, Duration::from_millis(1970));

    advance(Duration::from_millis(1000)).await;
    h.engine.on_deadline(Instant::now());
    assert!(matches!(h.engine.transition_state(), TransitionState::InFlight(_)));

    advance(Duration::from_millis(970)).await;
    h.engine.on_deadline(Instant::now());
    assert_eq!(*h.engine.transition_state(), TransitionState::Idle);
    assert_eq!(h.engine.active_slot(), SlotId::B);
    assert_eq!(h.engine.current_index(), 1);
    assert!(h.engine.deadline().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_crossfade_gains_never_exceed_start_level() {
    let mut h = loaded(2).await;
    let armed = h.progress(SlotId::A, 3000, 5000);
    h.engine.handle_slot_event(armed).await.unwrap();

    for _ in 0..20 {
        advance(Duration::from_millis(100)).await;
        let now = Instant::now();
        h.engine.render_gains(now);

        let gains = h.engine.gains();
        let a = gains.effective(SlotId::A, now);
        let b = gains.effective(SlotId::B, now);
        assert!(a + b <= 1.0 + 1e-4, "a={} b={}", a, b);
        assert!((0.0..=1.0).contains(&h.a.gain()));
        assert!((0.0..=1.0).contains(&h.b.gain()));
    }

    let now = Instant::now();
    assert!(h.engine.gains().effective(SlotId::A, now) < 1e-4);
    assert!((h.engine.gains().effective(SlotId::B, now) - 1.0).abs() < 1e-4);
}

#[tokio::test(start_paused = true)]
async fn test_standby_holds_next_track_while_idle() {
    let mut h = loaded(3).await;

    // Queued as soon as the first track starts, but not played
    assert_eq!(h.b.loads(), vec!["t2.mp3".to_string()]);
    assert!(!h.b.is_playing());
    assert_eq!(h.b.gain(), 0.0);

    // Arming reuses the queued track instead of loading it again
    let armed = h.progress(SlotId::A, 3100, 5000);
    h.engine.handle_slot_event(armed).await.unwrap();
    assert_eq!(h.b.loads(), vec!["t2.mp3".to_string()]);
    assert!(h.b.is_playing());

    // After the swap the old active slot queues the track after that
    advance(Duration::from_millis(1970)).await;
    h.engine.on_deadline(Instant::now());
    assert_eq!(h.engine.active_slot(), SlotId::B);
    assert_eq!(h.a.last_load().as_deref(), Some("t3.mp3"));
    assert!(!h.a.is_playing());
}

#[tokio::test(start_paused = true)]
async fn test_navigation_requeues_standby() {
    let mut h = loaded(3).await;

    h.engine.next().await.unwrap();
    assert_eq!(h.b.last_load().as_deref(), Some("t3.mp3"));

    h.engine.prev().await.unwrap();
    h.engine.prev().await.unwrap();
    assert_eq!(h.engine.current_index(), 2);
    assert_eq!(h.b.last_load().as_deref(), Some("t1.mp3"));
    assert_eq!(h.b.plays(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_crossfade_arms_once_per_track() {
    let mut h = loaded(3).await;

    for elapsed in [3100, 3400, 3900, 4500] {
        let event = h.progress(SlotId::A, elapsed, 5000);
        h.engine.handle_slot_event(event).await.unwrap();
    }

    assert_eq!(h.b.loads().len(), 1);
    assert_eq!(h.b.plays(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_standby_progress_never_arms() {
    let mut h = loaded(3).await;
    let event = h.progress(SlotId::B, 4900, 5000);
    h.engine.handle_slot_event(event).await.unwrap();
    assert_eq!(*h.engine.transition_state(), TransitionState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_stale_events_are_dropped() {
    let mut h = loaded(3).await;
    let stale = h.progress(SlotId::A, 4000, 5000);

    h.engine.next().await.unwrap();
    assert_eq!(h.engine.current_index(), 1);

    h.engine.handle_slot_event(stale).await.unwrap();
    assert_eq!(*h.engine.transition_state(), TransitionState::Idle);
    assert_eq!(h.b.plays(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_rejected_standby_falls_back_to_hard_switch() {
    let mut h = loaded(3).await;
    let mut rx = h.events.subscribe();
    h.b.reject_next_play(PlayRejection::GestureRequired);

    let armed = h.progress(SlotId::A, 3100, 5000);
    h.engine.handle_slot_event(armed).await.unwrap();

    assert_eq!(*h.engine.transition_state(), TransitionState::Idle);
    assert_eq!(h.engine.current_index(), 1);
    assert_eq!(h.engine.active_slot(), SlotId::A);
    assert!(h.engine.is_playing());
    assert_eq!(h.a.last_load().as_deref(), Some("t2.mp3"));
    assert!(h.a.is_playing());
    assert!(!h.b.is_playing());
    assert_eq!(h.a.gain(), 1.0);
    assert_eq!(h.b.gain(), 0.0);

    let events = drain(&mut rx);
    assert!(events
        .iter()
        .any(|e| matches!(e, PlayerEvent::CrossfadeAborted { to_index: 1, .. })));
    assert!(events.iter().any(|e| matches!(
        e,
        PlayerEvent::TrackStarted { index: 1, via: TransitionVia::HardSwitch, .. }
    )));
}

#[tokio::test(start_paused = true)]
async fn test_track_end_without_crossfade_advances() {
    let mut h = loaded(2).await;

    let ended = h.ended(SlotId::A);
    h.engine.handle_slot_event(ended).await.unwrap();

    assert_eq!(h.engine.current_index(), 1);
    assert_eq!(h.engine.active_slot(), SlotId::A);
    assert_eq!(h.a.last_load().as_deref(), Some("t2.mp3"));
    assert!(h.a.is_playing());
}

#[tokio::test(start_paused = true)]
async fn test_short_incoming_track_ending_mid_crossfade() {
    let mut h = loaded(3).await;
    let armed = h.progress(SlotId::A, 3100, 5000);
    h.engine.handle_slot_event(armed).await.unwrap();

    advance(Duration::from_millis(500)).await;
    let ended = h.ended(SlotId::B);
    h.engine.handle_slot_event(ended).await.unwrap();

    // Completed onto index 1, then advanced past it
    assert_eq!(*h.engine.transition_state(), TransitionState::Idle);
    assert_eq!(h.engine.active_slot(), SlotId::B);
    assert_eq!(h.engine.current_index(), 2);
    assert_eq!(h.b.last_load().as_deref(), Some("t3.mp3"));
}

// ============================================================================
// Navigation and play/pause
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_next_during_crossfade_cancels_and_hard_switches() {
    let mut h = loaded(3).await;
    let armed = h.progress(SlotId::A, 3100, 5000);
    h.engine.handle_slot_event(armed).await.unwrap();
    advance(Duration::from_millis(500)).await;

    h.engine.next().await.unwrap();

    assert_eq!(*h.engine.transition_state(), TransitionState::Idle);
    assert!(h.engine.deadline().is_none());
    assert!(!h.engine.is_animating());
    assert_eq!(h.engine.current_index(), 1);
    assert_eq!(h.engine.active_slot(), SlotId::A);
    assert_eq!(h.a.last_load().as_deref(), Some("t2.mp3"));
    assert!(h.a.is_playing());
    assert!(!h.b.is_playing());
    assert_eq!(h.a.gain(), 1.0);
    assert_eq!(h.b.gain(), 0.0);
}

#[tokio::test(start_paused = true)]
async fn test_prev_during_crossfade_uses_requested_index() {
    let mut h = loaded(3).await;
    let armed = h.progress(SlotId::A, 3100, 5000);
    h.engine.handle_slot_event(armed).await.unwrap();

    h.engine.prev().await.unwrap();

    assert_eq!(h.engine.current_index(), 2);
    assert_eq!(h.a.last_load().as_deref(), Some("t3.mp3"));
    assert_eq!(*h.engine.transition_state(), TransitionState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_index_stays_in_range() {
    let mut h = loaded(3).await;
    let moves = [true, true, true, true, false, false, false, false, false, true];

    for forward in moves {
        if forward {
            h.engine.next().await.unwrap();
        } else {
            h.engine.prev().await.unwrap();
        }
        let snapshot = h.engine.snapshot();
        assert!(snapshot.index < snapshot.total);
    }
}

#[tokio::test(start_paused = true)]
async fn test_single_track_queue_wraps_to_itself() {
    let mut h = loaded(1).await;
    h.engine.next().await.unwrap();
    assert_eq!(h.engine.current_index(), 0);
    h.engine.prev().await.unwrap();
    assert_eq!(h.engine.current_index(), 0);
    assert!(h.a.is_playing());
}

#[tokio::test(start_paused = true)]
async fn test_navigation_rejection_surfaces() {
    let mut h = loaded(3).await;
    h.a.reject_next_play(PlayRejection::Media("bad header".to_string()));

    let result = h.engine.next().await;
    assert!(matches!(result, Err(Error::PlaybackRejected(PlayRejection::Media(_)))));
    assert!(!h.engine.is_playing());
    assert_eq!(h.engine.current_index(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_pause_during_crossfade_settles_to_incoming() {
    let mut h = loaded(3).await;
    let armed = h.progress(SlotId::A, 3100, 5000);
    h.engine.handle_slot_event(armed).await.unwrap();

    h.engine.play_pause().await.unwrap();

    assert!(!h.engine.is_playing());
    assert_eq!(*h.engine.transition_state(), TransitionState::Idle);
    assert_eq!(h.engine.active_slot(), SlotId::B);
    assert_eq!(h.engine.current_index(), 1);
    assert!(!h.a.is_playing());
    assert!(!h.b.is_playing());

    h.engine.play_pause().await.unwrap();
    assert!(h.b.is_playing());
    assert!(!h.a.is_playing());
}

#[tokio::test(start_paused = true)]
async fn test_paused_player_does_not_arm() {
    let mut h = loaded(3).await;
    h.engine.play_pause().await.unwrap();

    let event = h.progress(SlotId::A, 4000, 5000);
    h.engine.handle_slot_event(event).await.unwrap();
    assert_eq!(*h.engine.transition_state(), TransitionState::Idle);
}

// ============================================================================
// Volume
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_volume_is_clamped() {
    let mut h = loaded(2).await;

    h.engine.set_volume(1.7).unwrap();
    assert_eq!(h.engine.volume(), 1.0);
    h.engine.set_volume(-0.5).unwrap();
    assert_eq!(h.engine.volume(), 0.0);
    assert!(matches!(h.engine.set_volume(f32::NAN), Err(Error::InvalidInput(_))));
    assert_eq!(h.engine.volume(), 0.0);
}

#[tokio::test(start_paused = true)]
async fn test_rapid_volume_changes_keep_gains_in_range() {
    let mut h = loaded(2).await;

    h.engine.set_volume(0.0).unwrap();
    advance(Duration::from_millis(5)).await;
    h.engine.set_volume(1.0).unwrap();

    for _ in 0..12 {
        advance(Duration::from_millis(10)).await;
        h.engine.render_gains(Instant::now());
    }

    for gain in h.a.gains().into_iter().chain(h.b.gains()) {
        assert!((0.0..=1.0).contains(&gain), "gain out of range: {}", gain);
    }
    assert!((h.a.gain() - 1.0).abs() < 1e-4);
    assert!(!h.engine.is_animating());
}

#[tokio::test(start_paused = true)]
async fn test_volume_scales_crossfade_without_double_applying() {
    let mut h = loaded(2).await;
    h.engine.set_volume(0.5).unwrap();
    advance(Duration::from_millis(100)).await;
    h.engine.render_gains(Instant::now());
    assert!((h.a.gain() - 0.5).abs() < 1e-4);

    let armed = h.progress(SlotId::A, 3000, 5000);
    h.engine.handle_slot_event(armed).await.unwrap();
    advance(Duration::from_secs(2)).await;
    h.engine.render_gains(Instant::now());

    assert!((h.b.gain() - 0.5).abs() < 1e-4);
    assert!(h.a.gain() < 1e-4);
}
