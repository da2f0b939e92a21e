//! Emoji Race - a tap-the-falling-target learning game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (spawning, collisions, worms, session state)
//! - `settings`: Runtime tunables loaded from JSON
//! - `web`: wasm-bindgen surface for the browser host

pub mod settings;
pub mod sim;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use settings::{LaneMode, Settings};

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Game configuration constants
pub mod consts {
    /// Nominal frame length the fall speeds are tuned against (60 Hz)
    pub const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Longest frame the tick will simulate (tab switches, debugger pauses)
    pub const MAX_FRAME_MS: f64 = 100.0;

    /// Hard cap on falling objects alive at once
    pub const MAX_ACTIVE_OBJECTS: usize = 30;
    /// Objects created per periodic spawn tick (before slot limits)
    pub const SPAWN_COUNT: usize = 8;
    /// Target objects the scheduler tries to keep on screen
    pub const TARGET_GUARANTEE_COUNT: usize = 2;
    /// Slots kept free for decoys when pruning
    pub const MIN_DECOY_SLOTS: usize = 2;
    /// Periodic spawn cadence
    pub const SPAWN_INTERVAL_MS: f64 = 1500.0;
    /// Delay before the first guaranteed targets, lets the host render once
    pub const IMMEDIATE_SPAWN_DELAY_MS: f64 = 100.0;
    /// Force a target spawn when none was spawned for this long
    pub const TARGET_STARVATION_MS: f64 = 6000.0;
    /// An item unseen for this long counts as stale
    pub const STALE_EMOJI_MS: f64 = 10_000.0;
    /// Forced target rotation deadline
    pub const TARGET_CHANGE_INTERVAL_MS: f64 = 10_000.0;
    /// Chance to pick a stale item when any exist
    pub const STALE_PICK_CHANCE: f64 = 0.7;
    /// Chance to allow an identity already on screen
    pub const DUPLICATE_ALLOW_CHANCE: f64 = 0.3;
    /// Pruning only touches objects past this fraction of viewport height
    pub const PRUNE_HEIGHT_FRACTION: f32 = 0.8;

    /// Falling object diameter (px)
    pub const EMOJI_SIZE: f32 = 60.0;
    /// Fall speed band (px per 60 Hz frame)
    pub const MIN_FALL_SPEED: f32 = 1.2;
    pub const MAX_FALL_SPEED: f32 = 2.4;
    /// Extra random height above the screen for new objects (px)
    pub const SPAWN_Y_JITTER: f32 = 120.0;
    /// Neighbours below this y are ignored by spawn placement (px)
    pub const SPAWN_ZONE_Y: f32 = 200.0;

    /// Vertical distance under which two objects can collide (px)
    pub const MIN_VERTICAL_GAP: f32 = 60.0;
    /// Horizontal nudge used by spawn placement (percent of lane)
    pub const HORIZONTAL_SEPARATION: f32 = 10.0;
    /// Minimum horizontal gap enforced per frame (percent of lane)
    pub const COLLISION_MIN_SEPARATION: f32 = 8.0;
    /// Lane x-bounds (percent of lane width)
    pub const LEFT_LANE_BOUNDS: (f32, f32) = (8.0, 92.0);
    pub const RIGHT_LANE_BOUNDS: (f32, f32) = (8.0, 92.0);

    /// Progress gained per correct tap
    pub const PROGRESS_PER_CORRECT: u32 = 10;
    /// Progress lost per wrong tap
    pub const PROGRESS_PENALTY: u32 = 5;
    /// Progress that completes a round
    pub const PROGRESS_MAX: u32 = 100;
    /// Continuous mode: completed rounds per level advance
    pub const TARGETS_PER_LEVEL: u32 = 10;

    /// Worm diameter (px)
    pub const WORM_SIZE: f32 = 60.0;
    /// Worm speed (px per 10 ms at multiplier 1)
    pub const WORM_BASE_SPEED: f32 = 1.5;
    /// Wiggle animation rate (radians per ms)
    pub const WORM_WIGGLE_RATE: f32 = 0.01;
    /// Fraction of the overlap a worm pushes an object per frame
    pub const WORM_PUSH_FACTOR: f32 = 0.3;
    pub const WORM_INITIAL_COUNT: usize = 5;
    pub const WORM_PROGRESSIVE_SPAWN_INTERVAL_MS: f64 = 3000.0;
    pub const WORM_RECURRING_COUNT: usize = 3;
    pub const WORM_RECURRING_INTERVAL_MS: f64 = 30_000.0;
    /// Undrained events kept by a session; older ones are dropped first
    pub const MAX_BUFFERED_EVENTS: usize = 1024;
    /// Upper clamp for the host-controlled worm speed multiplier
    pub const MAX_WORM_SPEED_MULTIPLIER: f32 = 5.0;

    /// Tap validation thresholds
    pub const TAP_DEBOUNCE_MS: f64 = 150.0;
    pub const TAP_MAX_MOVEMENT_PX: f32 = 15.0;
    pub const TAP_MAX_DURATION_MS: f64 = 800.0;

    /// Viewport used until the host reports one
    pub const DEFAULT_VIEWPORT_WIDTH: f32 = 1280.0;
    pub const DEFAULT_VIEWPORT_HEIGHT: f32 = 800.0;
}

/// Host display size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: consts::DEFAULT_VIEWPORT_WIDTH,
            height: consts::DEFAULT_VIEWPORT_HEIGHT,
        }
    }
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }.sanitized()
    }

    /// Replace non-finite or non-positive sizes with 1px
    pub fn sanitized(self) -> Self {
        let fix = |v: f32| if v.is_finite() && v > 1.0 { v } else { 1.0 };
        Self {
            width: fix(self.width),
            height: fix(self.height),
        }
    }
}

/// Percent of an extent to pixels
#[inline]
pub fn percent_to_px(percent: f32, extent: f32) -> f32 {
    percent / 100.0 * extent
}

/// Pixels to percent of an extent (0 for a degenerate extent)
#[inline]
pub fn px_to_percent(px: f32, extent: f32) -> f32 {
    if extent <= 0.0 { 0.0 } else { px / extent * 100.0 }
}

/// True when two circles strictly overlap
#[inline]
pub fn circles_overlap(a: Vec2, radius_a: f32, b: Vec2, radius_b: f32) -> bool {
    a.distance(b) < radius_a + radius_b
}

/// Monotonic entity id source shared by objects and worms
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdGen {
    next: u32,
}

impl Default for IdGen {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdGen {
    /// Allocate a new entity ID
    pub fn next_id(&mut self) -> u32 {
        let id = self.next;
        self.next = self.next.wrapping_add(1).max(1);
        id
    }
}
