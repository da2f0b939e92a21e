//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Explicit clock, advanced only by `tick`
//! - Seeded RNG only
//! - Timers are data owned by the session, never callbacks
//! - No rendering, audio or platform dependencies

pub mod category;
pub mod collision;
pub mod events;
pub mod input;
pub mod session;
pub mod spawn;
pub mod state;
pub mod target_pool;
pub mod tick;
pub mod timers;
pub mod worms;

use thiserror::Error;

pub use category::{Categories, Category, CategoryError, CategoryItem, default_categories};
pub use collision::{LaneCollisionOptions, apply_worm_object_collision, process_lane_collisions};
pub use events::{AudioCue, AudioCueQueue, EventSink, GameEvent, LogSink};
pub use input::{TapDebouncer, TapEvent, TapGesture, TapRejection, TapTarget};
pub use session::{Session, Snapshot, TapOutcome};
pub use spawn::{SpawnContext, SpawnOutcome, SpawnScheduler, safe_spawn_position};
pub use state::{FallingObject, GamePhase, GameState, Lane, Worm};
pub use target_pool::TargetPool;
pub use tick::{TickInput, tick};
pub use timers::{TimerKind, TimerQueue};
pub use worms::{create_worms, purge_dead, update_worm_positions};

/// Failure inside a single tick. The tick reports it and carries on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Level {level} item {index} has no identity or glyph")]
    MalformedItem { level: usize, index: usize },

    #[error("Level {level} target has no identity or glyph")]
    MalformedTarget { level: usize },

    #[error("No target selected for level {level}")]
    NoTarget { level: usize },
}
