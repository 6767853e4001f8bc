//! Per-hand gesture debouncing and the Tracking/Released sub-machine.

#[cfg(test)]
mod tests;

use log::info;

use crate::types::{GestureLabel, Hand, HandGestures, HandPair};

pub const DEFAULT_STREAK_REQUIRED: u8 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackState {
    Tracking,
    Released,
}

impl TrackState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tracking => "tracking",
            Self::Released => "released",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TrackTransition {
    Released,
    /// Hand picked up again; `reference_offset` is the hand-to-head offset
    /// captured at that instant.
    Retracked { reference_offset: f32 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandTrack {
    state: TrackState,
    last_seen: Option<GestureLabel>,
    streak: u8,
    reference_offset: Option<f32>,
}

impl Default for HandTrack {
    fn default() -> Self {
        Self::new()
    }
}

impl HandTrack {
    pub const fn new() -> Self {
        Self {
            state: TrackState::Tracking,
            last_seen: None,
            streak: 0,
            reference_offset: None,
        }
    }

    pub fn state(&self) -> TrackState {
        self.state
    }

    pub fn last_seen(&self) -> Option<GestureLabel> {
        self.last_seen
    }

    pub fn streak(&self) -> u8 {
        self.streak
    }

    /// Offset captured at the last re-track; `None` means the baseline
    /// offset is the active reference.
    pub fn reference_offset(&self) -> Option<f32> {
        self.reference_offset
    }

    /// Feeds one observation. `current_offset` is the hand-to-head offset of
    /// the sample being processed, captured if this observation re-tracks.
    pub fn observe(
        &mut self,
        label: Option<GestureLabel>,
        current_offset: f32,
        streak_required: u8,
    ) -> Option<TrackTransition> {
        let label = label?;

        if self.last_seen == Some(label) {
            self.streak = self.streak.saturating_add(1);
        } else {
            self.last_seen = Some(label);
            self.streak = 1;
        }

        if self.streak < streak_required {
            return None;
        }

        match (self.state, label) {
            (TrackState::Tracking, GestureLabel::OpenPalm) => {
                self.state = TrackState::Released;
                self.streak = 0;
                Some(TrackTransition::Released)
            }
            (TrackState::Released, GestureLabel::ClosedFist) => {
                self.state = TrackState::Tracking;
                self.reference_offset = Some(current_offset);
                self.streak = 0;
                Some(TrackTransition::Retracked {
                    reference_offset: current_offset,
                })
            }
            (TrackState::Tracking, GestureLabel::ClosedFist | GestureLabel::Other)
            | (TrackState::Released, GestureLabel::OpenPalm | GestureLabel::Other) => None,
        }
    }

    /// Back to Tracking against the baseline offset, with a clean streak.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    #[cfg(test)]
    pub(crate) fn released_for_test() -> Self {
        Self {
            state: TrackState::Released,
            ..Self::new()
        }
    }

    #[cfg(test)]
    pub(crate) fn with_reference_for_test(reference_offset: f32) -> Self {
        Self {
            reference_offset: Some(reference_offset),
            ..Self::new()
        }
    }
}

pub struct GestureDebouncer {
    streak_required: u8,
    tracks: HandPair<HandTrack>,
}

impl Default for GestureDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_STREAK_REQUIRED)
    }
}

impl GestureDebouncer {
    pub fn new(streak_required: u8) -> Self {
        Self {
            streak_required: streak_required.max(1),
            tracks: HandPair::splat(HandTrack::new()),
        }
    }

    pub fn tracks(&self) -> &HandPair<HandTrack> {
        &self.tracks
    }

    pub fn track(&self, hand: Hand) -> &HandTrack {
        self.tracks.get(hand)
    }

    pub fn observe(
        &mut self,
        gestures: HandGestures,
        offsets: HandPair<f32>,
    ) -> HandPair<Option<TrackTransition>> {
        let streak_required = self.streak_required;
        let tracks = &mut self.tracks;
        HandPair::new(Hand::Left, Hand::Right).map(|_, hand| {
            let transition = tracks.get_mut(hand).observe(
                *gestures.get(hand),
                *offsets.get(hand),
                streak_required,
            );
            match transition {
                Some(TrackTransition::Released) => {
                    info!("hand={} released", hand.as_str());
                }
                Some(TrackTransition::Retracked { reference_offset }) => {
                    info!(
                        "hand={} retracked reference_offset={:.3}",
                        hand.as_str(),
                        reference_offset
                    );
                }
                None => {}
            }
            transition
        })
    }

    pub fn reset_tracking(&mut self) {
        for hand in Hand::ALL {
            self.tracks.get_mut(hand).reset();
        }
    }
}
