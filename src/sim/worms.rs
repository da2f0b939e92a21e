//! Worm creation and movement
//!
//! Worms random-walk inside their lane and bounce elastically off the lane
//! bounds and the top/bottom of the viewport. Killing one only flips
//! `alive`; the session purges dead worms at the end of the frame.

use std::f32::consts::TAU;

use rand::Rng;

use super::state::Worm;
use crate::consts::{WORM_BASE_SPEED, WORM_WIGGLE_RATE};
use crate::{IdGen, LaneMode, Viewport, percent_to_px, px_to_percent};

/// Pixel range a worm centre may occupy horizontally in its lane
fn horizontal_limits(worm: &Worm, lane_width: f32) -> (f32, f32) {
    let (min, max) = worm.lane.bounds();
    let r = worm.radius();
    let lo = percent_to_px(min, lane_width).max(r);
    let hi = percent_to_px(max, lane_width).min(lane_width - r);
    if lo <= hi { (lo, hi) } else { (lane_width / 2.0, lane_width / 2.0) }
}

/// Pixel range a worm centre may occupy vertically
fn vertical_limits(worm: &Worm, viewport: &Viewport) -> (f32, f32) {
    let r = worm.radius();
    if viewport.height > 2.0 * r {
        (r, viewport.height - r)
    } else {
        (viewport.height / 2.0, viewport.height / 2.0)
    }
}

/// Create `count` worms; `start_index` keeps lane alternation going across waves
pub fn create_worms<R: Rng + ?Sized>(
    count: usize,
    start_index: usize,
    ids: &mut IdGen,
    rng: &mut R,
    viewport: &Viewport,
    lane_mode: LaneMode,
) -> Vec<Worm> {
    let lane_width = lane_mode.lane_width(viewport);

    (0..count)
        .map(|i| {
            let lane = lane_mode.lane_for_index(start_index + i);
            let mut worm = Worm {
                id: ids.next_id(),
                lane,
                x: 0.0,
                y: 0.0,
                vx: 0.0,
                vy: 0.0,
                angle: 0.0,
                wiggle_phase: rng.random_range(0.0..TAU),
                alive: true,
            };

            let (x_lo, x_hi) = horizontal_limits(&worm, lane_width);
            let (y_lo, y_hi) = vertical_limits(&worm, viewport);
            worm.x = px_to_percent(lerp(x_lo, x_hi, rng.random::<f32>()), lane_width);
            worm.y = lerp(y_lo, y_hi, rng.random::<f32>());

            let heading = rng.random_range(0.0..TAU);
            let speed = WORM_BASE_SPEED * rng.random_range(0.5..1.5);
            worm.vx = heading.cos() * speed;
            worm.vy = heading.sin() * speed;
            worm.angle = heading;
            worm
        })
        .collect()
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Advance every live worm by `dt_ms`
pub fn update_worm_positions(
    worms: &mut [Worm],
    dt_ms: f32,
    speed_multiplier: f32,
    viewport: &Viewport,
    lane_mode: LaneMode,
) {
    let lane_width = lane_mode.lane_width(viewport);
    let step = speed_multiplier * dt_ms / 10.0;

    for worm in worms.iter_mut().filter(|w| w.alive) {
        let (x_lo, x_hi) = horizontal_limits(worm, lane_width);
        let (y_lo, y_hi) = vertical_limits(worm, viewport);

        let mut x = percent_to_px(worm.x, lane_width) + worm.vx * step;
        let mut y = worm.y + worm.vy * step;

        if x < x_lo {
            x = x_lo;
            worm.vx = worm.vx.abs();
        } else if x > x_hi {
            x = x_hi;
            worm.vx = -worm.vx.abs();
        }
        if y < y_lo {
            y = y_lo;
            worm.vy = worm.vy.abs();
        } else if y > y_hi {
            y = y_hi;
            worm.vy = -worm.vy.abs();
        }

        worm.x = px_to_percent(x, lane_width);
        worm.y = y;
        worm.angle = worm.vy.atan2(worm.vx);
        worm.wiggle_phase = (worm.wiggle_phase + dt_ms * WORM_WIGGLE_RATE) % TAU;
    }
}

/// Drop dead worms; returns how many were removed
pub fn purge_dead(worms: &mut Vec<Worm>) -> usize {
    let before = worms.len();
    worms.retain(|w| w.alive);
    before - worms.len()
}
