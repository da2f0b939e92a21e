//! Runtime settings
//!
//! Loaded from JSON by the host; everything has a sensible default so a
//! missing or broken file never stops a session from starting.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Viewport;
use crate::consts::MAX_WORM_SPEED_MULTIPLIER;
use crate::sim::Lane;

/// How many lanes the play field is split into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LaneMode {
    /// One player, one lane spanning the whole viewport
    #[default]
    Single,
    /// Two players side by side, each lane half the viewport
    Dual,
}

impl LaneMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LaneMode::Single => "single",
            LaneMode::Dual => "dual",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "single" | "1" => Some(LaneMode::Single),
            "dual" | "double" | "2" => Some(LaneMode::Dual),
            _ => None,
        }
    }

    /// Lanes in play for this mode
    pub fn lanes(&self) -> &'static [Lane] {
        match self {
            LaneMode::Single => &[Lane::Left],
            LaneMode::Dual => &[Lane::Left, Lane::Right],
        }
    }

    /// Pixel width of a single lane
    pub fn lane_width(&self, viewport: &Viewport) -> f32 {
        match self {
            LaneMode::Single => viewport.width,
            LaneMode::Dual => viewport.width / 2.0,
        }
    }

    /// Lane for the n-th entity created (alternates in dual mode)
    pub fn lane_for_index(&self, index: usize) -> Lane {
        match self {
            LaneMode::Single => Lane::Left,
            LaneMode::Dual => {
                if index % 2 == 0 {
                    Lane::Left
                } else {
                    Lane::Right
                }
            }
        }
    }
}

/// Session settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// RNG seed; `None` lets the host pick one
    pub seed: Option<u64>,
    /// Reaching 100% resets progress instead of ending the game
    pub continuous_mode: bool,
    pub lane_mode: LaneMode,
    /// Scales the speed of newly spawned objects
    pub fall_speed_multiplier: f32,
    /// Initial worm speed multiplier
    pub worm_speed_multiplier: f32,
    pub worms_enabled: bool,
    /// Never start a refilled pool with the item drawn just before it
    pub avoid_repeat_on_refill: bool,
    /// Separate objects stacked at exactly the same x (off: leave them)
    pub break_exact_overlaps: bool,
    /// Viewport used until the host reports one
    pub viewport: Viewport,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: None,
            continuous_mode: false,
            lane_mode: LaneMode::Single,
            fall_speed_multiplier: 1.0,
            worm_speed_multiplier: 1.0,
            worms_enabled: true,
            avoid_repeat_on_refill: false,
            break_exact_overlaps: false,
            viewport: Viewport::default(),
        }
    }
}

impl Settings {
    /// Parse settings from JSON (missing fields take defaults)
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Settings>(json).map(Settings::sanitized)
    }

    /// Load settings from a file, falling back to defaults on any failure
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("Invalid settings in {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Cannot read settings {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Clamp multipliers into usable ranges
    pub fn sanitized(mut self) -> Self {
        let clamp_mult = |v: f32, max: f32| if v.is_finite() { v.clamp(0.1, max) } else { 1.0 };
        self.fall_speed_multiplier = clamp_mult(self.fall_speed_multiplier, 5.0);
        self.worm_speed_multiplier = clamp_mult(self.worm_speed_multiplier, MAX_WORM_SPEED_MULTIPLIER);
        self.viewport = self.viewport.sanitized();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = Settings::from_json(r#"{ "continuous_mode": true, "lane_mode": "Dual" }"#)
            .expect("valid json");
        assert!(settings.continuous_mode);
        assert_eq!(settings.lane_mode, LaneMode::Dual);
        assert_eq!(settings.fall_speed_multiplier, 1.0);
        assert!(settings.worms_enabled);
    }

    #[test]
    fn test_sanitized_clamps_multipliers() {
        let settings = Settings::from_json(r#"{ "fall_speed_multiplier": 50.0, "worm_speed_multiplier": 0.0 }"#)
            .expect("valid json");
        assert_eq!(settings.fall_speed_multiplier, 5.0);
        assert_eq!(settings.worm_speed_multiplier, 0.1);
    }

    #[test]
    fn test_bad_json_is_error() {
        assert!(Settings::from_json("{ nope").is_err());
    }

    #[test]
    fn test_missing_file_falls_back() {
        let settings = Settings::load(Path::new("/definitely/not/here.json"));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_lane_mode_lanes() {
        assert_eq!(LaneMode::Single.lanes(), &[Lane::Left]);
        assert_eq!(LaneMode::Dual.lanes().len(), 2);
        assert_eq!(LaneMode::from_str("DUAL"), Some(LaneMode::Dual));
        assert_eq!(LaneMode::Dual.lane_for_index(3), Lane::Right);
        let vp = Viewport::new(1000.0, 600.0);
        assert_eq!(LaneMode::Dual.lane_width(&vp), 500.0);
    }
}
