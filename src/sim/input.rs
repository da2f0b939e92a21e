//! Tap validation
//!
//! Raw pointer gestures from the host become logical taps here. Drags, long
//! presses and rapid repeats on the same target are rejected so a child
//! mashing the screen cannot double-count a single object.

use std::collections::HashMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::Lane;
use crate::consts::{TAP_DEBOUNCE_MS, TAP_MAX_DURATION_MS, TAP_MAX_MOVEMENT_PX};

/// What a tap landed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TapTarget {
    Object(u32),
    Worm(u32),
}

/// A validated logical tap
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TapEvent {
    pub target: TapTarget,
    /// Which player's side the tap came from, if the host knows
    pub lane: Option<Lane>,
}

impl TapEvent {
    pub fn object(id: u32) -> Self {
        Self {
            target: TapTarget::Object(id),
            lane: None,
        }
    }

    pub fn worm(id: u32) -> Self {
        Self {
            target: TapTarget::Worm(id),
            lane: None,
        }
    }
}

/// A pointer press/release pair as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TapGesture {
    pub target: TapTarget,
    pub lane: Option<Lane>,
    /// Press position (px)
    pub start: Vec2,
    /// Release position (px)
    pub end: Vec2,
    pub duration_ms: f64,
    /// Host time of the release (ms)
    pub time_ms: f64,
}

impl TapGesture {
    /// A clean, instantaneous tap
    pub fn quick(target: TapTarget, time_ms: f64) -> Self {
        Self {
            target,
            lane: None,
            start: Vec2::ZERO,
            end: Vec2::ZERO,
            duration_ms: 0.0,
            time_ms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapRejection {
    Drag,
    LongPress,
    Duplicate,
}

/// Per-session tap filter
#[derive(Debug, Clone)]
pub struct TapDebouncer {
    pub debounce_ms: f64,
    pub max_movement_px: f32,
    pub max_duration_ms: f64,
    last_accepted: HashMap<TapTarget, f64>,
}

impl Default for TapDebouncer {
    fn default() -> Self {
        Self {
            debounce_ms: TAP_DEBOUNCE_MS,
            max_movement_px: TAP_MAX_MOVEMENT_PX,
            max_duration_ms: TAP_MAX_DURATION_MS,
            last_accepted: HashMap::new(),
        }
    }
}

impl TapDebouncer {
    pub fn validate(&mut self, gesture: &TapGesture) -> Result<TapEvent, TapRejection> {
        if gesture.start.distance(gesture.end) > self.max_movement_px {
            return Err(TapRejection::Drag);
        }
        if gesture.duration_ms > self.max_duration_ms {
            return Err(TapRejection::LongPress);
        }

        let window = self.debounce_ms;
        let now = gesture.time_ms;
        self.last_accepted.retain(|_, t| now - *t < window);
        if self.last_accepted.contains_key(&gesture.target) {
            return Err(TapRejection::Duplicate);
        }
        self.last_accepted.insert(gesture.target, now);

        Ok(TapEvent {
            target: gesture.target,
            lane: gesture.lane,
        })
    }

    /// Forget recent taps (session start/reset)
    pub fn reset(&mut self) {
        self.last_accepted.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_clean_tap() {
        let mut debouncer = TapDebouncer::default();
        let tap = debouncer
            .validate(&TapGesture::quick(TapTarget::Object(4), 10.0))
            .expect("clean tap");
        assert_eq!(tap.target, TapTarget::Object(4));
    }

    #[test]
    fn test_rejects_drag_and_long_press() {
        let mut debouncer = TapDebouncer::default();
        let mut drag = TapGesture::quick(TapTarget::Object(1), 0.0);
        drag.end = Vec2::new(40.0, 0.0);
        assert_eq!(debouncer.validate(&drag), Err(TapRejection::Drag));

        let mut hold = TapGesture::quick(TapTarget::Object(1), 0.0);
        hold.duration_ms = 2000.0;
        assert_eq!(debouncer.validate(&hold), Err(TapRejection::LongPress));
    }

    #[test]
    fn test_duplicate_window() {
        let mut debouncer = TapDebouncer::default();
        let target = TapTarget::Worm(9);
        assert!(debouncer.validate(&TapGesture::quick(target, 0.0)).is_ok());
        assert_eq!(
            debouncer.validate(&TapGesture::quick(target, 100.0)),
            Err(TapRejection::Duplicate)
        );
        // A different target is unaffected
        assert!(debouncer.validate(&TapGesture::quick(TapTarget::Worm(10), 100.0)).is_ok());
        assert!(debouncer.validate(&TapGesture::quick(target, 200.0)).is_ok());

        debouncer.reset();
        assert!(debouncer.validate(&TapGesture::quick(target, 201.0)).is_ok());
    }
}
