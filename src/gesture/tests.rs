use super::*;
use crate::types::GestureLabel::{ClosedFist, OpenPalm, Other};

fn feed(track: &mut HandTrack, labels: &[Option<GestureLabel>]) -> Vec<Option<TrackTransition>> {
    labels
        .iter()
        .enumerate()
        .map(|(i, label)| track.observe(*label, i as f32, DEFAULT_STREAK_REQUIRED))
        .collect()
}

#[test]
fn three_open_palms_release() {
    let mut track = HandTrack::new();
    let transitions = feed(&mut track, &[Some(OpenPalm), Some(OpenPalm), Some(OpenPalm)]);
    assert_eq!(transitions, vec![None, None, Some(TrackTransition::Released)]);
    assert_eq!(track.state(), TrackState::Released);
    assert_eq!(track.streak(), 0);
}

#[test]
fn two_observations_never_transition() {
    let mut track = HandTrack::new();
    feed(&mut track, &[Some(OpenPalm), Some(OpenPalm), Some(Other)]);
    assert_eq!(track.state(), TrackState::Tracking);
    assert_eq!(track.last_seen(), Some(Other));
    assert_eq!(track.streak(), 1);
}

#[test]
fn alternating_labels_reset_streak() {
    let mut track = HandTrack::released_for_test();
    let labels: Vec<_> = (0..20)
        .map(|i| Some(if i % 2 == 0 { ClosedFist } else { OpenPalm }))
        .collect();
    let transitions = feed(&mut track, &labels);
    assert!(transitions.iter().all(Option::is_none));
    assert_eq!(track.state(), TrackState::Released);
}

#[test]
fn absent_label_is_no_observation() {
    let mut track = HandTrack::new();
    let transitions = feed(
        &mut track,
        &[Some(OpenPalm), None, Some(OpenPalm), None, None, Some(OpenPalm)],
    );
    assert_eq!(transitions[5], Some(TrackTransition::Released));
}

#[test]
fn retrack_captures_current_offset() {
    let mut track = HandTrack::released_for_test();
    assert_eq!(track.observe(Some(ClosedFist), 0.10, 3), None);
    assert_eq!(track.observe(Some(ClosedFist), 0.20, 3), None);
    assert_eq!(
        track.observe(Some(ClosedFist), 0.25, 3),
        Some(TrackTransition::Retracked {
            reference_offset: 0.25
        })
    );
    assert_eq!(track.state(), TrackState::Tracking);
    assert_eq!(track.reference_offset(), Some(0.25));
    assert_eq!(track.streak(), 0);
}

#[test]
fn same_state_gestures_do_nothing() {
    let mut track = HandTrack::new();
    for _ in 0..10 {
        assert_eq!(track.observe(Some(ClosedFist), 0.0, 3), None);
    }
    assert_eq!(track.state(), TrackState::Tracking);
    // Streak keeps counting without a transition.
    assert_eq!(track.streak(), 10);

    let mut released = HandTrack::released_for_test();
    for _ in 0..10 {
        assert_eq!(released.observe(Some(OpenPalm), 0.0, 3), None);
    }
    assert_eq!(released.state(), TrackState::Released);
}

#[test]
fn release_needs_fresh_streak_after_transition() {
    let mut track = HandTrack::released_for_test();
    feed(&mut track, &[Some(ClosedFist); 3]);
    assert_eq!(track.state(), TrackState::Tracking);

    // Last-seen is still ClosedFist; a single open palm starts a new streak.
    assert_eq!(track.observe(Some(OpenPalm), 0.0, 3), None);
    assert_eq!(track.streak(), 1);
}

#[test]
fn debouncer_tracks_hands_independently() {
    let mut debouncer = GestureDebouncer::default();
    let gestures = HandGestures::new(Some(OpenPalm), Some(ClosedFist));
    let offsets = HandPair::new(-0.3, -0.2);

    let mut last = HandPair::splat(None);
    for _ in 0..3 {
        last = debouncer.observe(gestures, offsets);
    }
    assert_eq!(last.left, Some(TrackTransition::Released));
    assert_eq!(last.right, None);
    assert_eq!(debouncer.track(Hand::Left).state(), TrackState::Released);
    assert_eq!(debouncer.track(Hand::Right).state(), TrackState::Tracking);

    debouncer.reset_tracking();
    assert_eq!(debouncer.tracks().left, HandTrack::new());
}

#[test]
fn streak_threshold_is_configurable() {
    let mut debouncer = GestureDebouncer::new(5);
    let gestures = HandGestures::new(Some(OpenPalm), None);
    for _ in 0..4 {
        debouncer.observe(gestures, HandPair::splat(0.0));
    }
    assert_eq!(debouncer.track(Hand::Left).state(), TrackState::Tracking);
    debouncer.observe(gestures, HandPair::splat(0.0));
    assert_eq!(debouncer.track(Hand::Left).state(), TrackState::Released);
}
