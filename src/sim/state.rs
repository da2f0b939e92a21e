//! Game state and core simulation types
//!
//! Plain data only. Everything here is serializable so hosts can render
//! from a snapshot without touching the session.

use serde::{Deserialize, Serialize};

use super::category::CategoryItem;
use crate::consts::*;

/// One of the two horizontal strips of the play field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Lane {
    #[default]
    Left,
    Right,
}

impl Lane {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lane::Left => "left",
            Lane::Right => "right",
        }
    }

    /// Parse a host lane name; players are numbered from 1
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "left" | "1" => Some(Lane::Left),
            "right" | "2" => Some(Lane::Right),
            _ => None,
        }
    }

    /// Horizontal bounds (percent of lane width)
    pub fn bounds(&self) -> (f32, f32) {
        match self {
            Lane::Left => LEFT_LANE_BOUNDS,
            Lane::Right => RIGHT_LANE_BOUNDS,
        }
    }

    /// Clamp an x percentage into this lane
    #[inline]
    pub fn clamp_x(&self, x: f32) -> f32 {
        let (min, max) = self.bounds();
        x.clamp(min, max)
    }
}

/// A falling emoji/letter/number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallingObject {
    pub id: u32,
    /// Semantic type, compared against the current target
    pub identity: String,
    /// What gets drawn
    pub glyph: String,
    /// Percent of lane width
    pub x: f32,
    /// Pixels from the top, negative while above the screen
    pub y: f32,
    /// Pixels per 60 Hz frame
    pub speed: f32,
    pub lane: Lane,
    /// Diameter in pixels
    pub size: f32,
}

impl FallingObject {
    pub fn new(id: u32, item: &CategoryItem, lane: Lane, x: f32, y: f32, speed: f32) -> Self {
        Self {
            id,
            identity: item.identity.clone(),
            glyph: item.glyph.clone(),
            x,
            y,
            speed,
            lane,
            size: EMOJI_SIZE,
        }
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.size / 2.0
    }

    pub fn is(&self, item: &CategoryItem) -> bool {
        self.identity == item.identity
    }
}

/// A roaming distractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worm {
    pub id: u32,
    pub lane: Lane,
    /// Percent of lane width
    pub x: f32,
    /// Pixels from the top
    pub y: f32,
    /// Pixels per 10 ms
    pub vx: f32,
    pub vy: f32,
    /// Heading in radians, follows the velocity
    pub angle: f32,
    pub wiggle_phase: f32,
    pub alive: bool,
}

impl Worm {
    #[inline]
    pub fn radius(&self) -> f32 {
        WORM_SIZE / 2.0
    }
}

/// Coarse session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Not started or reset
    Idle,
    /// Taps count
    Playing,
    /// Reached 100% in standard mode
    Won,
}

/// Authoritative session record
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GameState {
    /// Index into the category list
    pub level: usize,
    pub current_target: Option<CategoryItem>,
    /// 0..=100
    pub progress: u32,
    /// Consecutive correct taps
    pub streak: u32,
    pub game_started: bool,
    pub winner: bool,
    /// Session time (ms) at which the target is rotated
    pub target_change_time: f64,
    /// Completed rounds in continuous mode
    pub targets_destroyed: u32,
}

impl GameState {
    pub fn phase(&self) -> GamePhase {
        if !self.game_started {
            GamePhase::Idle
        } else if self.winner {
            GamePhase::Won
        } else {
            GamePhase::Playing
        }
    }

    pub fn is_playing(&self) -> bool {
        self.phase() == GamePhase::Playing
    }

    /// Identity of the current target, if any
    pub fn target_identity(&self) -> Option<&str> {
        self.current_target.as_ref().map(|t| t.identity.as_str())
    }

    pub fn add_progress(&mut self, amount: u32) {
        self.progress = (self.progress + amount).min(PROGRESS_MAX);
    }

    pub fn remove_progress(&mut self, amount: u32) {
        self.progress = self.progress.saturating_sub(amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_transitions() {
        let mut state = GameState::default();
        assert_eq!(state.phase(), GamePhase::Idle);
        state.game_started = true;
        assert_eq!(state.phase(), GamePhase::Playing);
        state.winner = true;
        assert_eq!(state.phase(), GamePhase::Won);
    }

    #[test]
    fn test_progress_is_clamped() {
        let mut state = GameState::default();
        state.remove_progress(PROGRESS_PENALTY);
        assert_eq!(state.progress, 0);
        for _ in 0..20 {
            state.add_progress(PROGRESS_PER_CORRECT);
        }
        assert_eq!(state.progress, PROGRESS_MAX);
    }

    #[test]
    fn test_lane_names() {
        assert_eq!(Lane::from_str("Right"), Some(Lane::Right));
        assert_eq!(Lane::from_str("1"), Some(Lane::Left));
        assert_eq!(Lane::from_str(Lane::Right.as_str()), Some(Lane::Right));
        assert_eq!(Lane::from_str("middle"), None);
    }

    #[test]
    fn test_lane_clamp() {
        let (min, max) = Lane::Right.bounds();
        assert_eq!(Lane::Right.clamp_x(-10.0), min);
        assert_eq!(Lane::Right.clamp_x(500.0), max);
        assert_eq!(Lane::Left.clamp_x(50.0), 50.0);
    }
}
