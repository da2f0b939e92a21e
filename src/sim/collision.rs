//! Collision resolution for falling objects and worms
//!
//! Two passes run every frame, lane separation first and worm pushes second:
//! - objects in the same lane are pushed apart horizontally only, so fall
//!   speed and vertical order are untouched
//! - worms shove objects radially out of their way without slowing either

use glam::Vec2;

use super::state::{FallingObject, Lane, Worm};
use crate::consts::{COLLISION_MIN_SEPARATION, MIN_VERTICAL_GAP, WORM_PUSH_FACTOR};
use crate::{LaneMode, Viewport, circles_overlap, percent_to_px, px_to_percent};

/// Options for the lane pass
#[derive(Debug, Clone, Copy, Default)]
pub struct LaneCollisionOptions {
    /// Separate objects at exactly the same x (lower id goes left)
    pub break_exact_overlaps: bool,
}

/// Separate overlapping objects within each lane.
///
/// Objects are visited in `y` order and only compared with the neighbours
/// that follow within `MIN_VERTICAL_GAP`, so the inner loop stays short.
/// Objects still above the screen are left alone.
pub fn process_lane_collisions(objects: &mut [FallingObject], options: LaneCollisionOptions) {
    for lane in [Lane::Left, Lane::Right] {
        let mut order: Vec<usize> = (0..objects.len())
            .filter(|&i| objects[i].lane == lane)
            .collect();
        order.sort_by(|&a, &b| objects[a].y.total_cmp(&objects[b].y));

        for (pos, &i) in order.iter().enumerate() {
            if objects[i].y < 0.0 {
                continue;
            }
            objects[i].x = lane.clamp_x(objects[i].x);

            for &j in &order[pos + 1..] {
                if objects[j].y - objects[i].y > MIN_VERTICAL_GAP {
                    break;
                }
                separate_pair(objects, i, j, lane, options);
            }
        }
    }
}

fn separate_pair(
    objects: &mut [FallingObject],
    i: usize,
    j: usize,
    lane: Lane,
    options: LaneCollisionOptions,
) {
    let dx = objects[j].x - objects[i].x;
    let gap = dx.abs();
    if gap >= COLLISION_MIN_SEPARATION {
        return;
    }

    // Which one ends up on the left
    let (left, right) = if dx > 0.0 {
        (i, j)
    } else if dx < 0.0 {
        (j, i)
    } else if options.break_exact_overlaps {
        if objects[i].id < objects[j].id { (i, j) } else { (j, i) }
    } else {
        return;
    };

    let push = (COLLISION_MIN_SEPARATION - gap) / 2.0;
    objects[left].x = lane.clamp_x(objects[left].x - push);
    objects[right].x = lane.clamp_x(objects[right].x + push);

    // A bound ate part of the push: the other side takes the rest
    let remaining = COLLISION_MIN_SEPARATION - (objects[right].x - objects[left].x);
    if remaining > 0.0 {
        let (min, max) = lane.bounds();
        if objects[left].x <= min {
            objects[right].x = lane.clamp_x(objects[right].x + remaining);
        } else if objects[right].x >= max {
            objects[left].x = lane.clamp_x(objects[left].x - remaining);
        }
    }
}

/// Push objects out from under live worms.
///
/// Distances are measured in pixels using the current lane width, so a
/// resize between frames is picked up immediately. Only position changes.
pub fn apply_worm_object_collision(
    worms: &[Worm],
    objects: &mut [FallingObject],
    viewport: &Viewport,
    lane_mode: LaneMode,
) {
    let lane_width = lane_mode.lane_width(viewport);

    for worm in worms.iter().filter(|w| w.alive) {
        let worm_pos = Vec2::new(percent_to_px(worm.x, lane_width), worm.y);

        for object in objects.iter_mut().filter(|o| o.lane == worm.lane) {
            let object_pos = Vec2::new(percent_to_px(object.x, lane_width), object.y);
            if !circles_overlap(worm_pos, worm.radius(), object_pos, object.radius()) {
                continue;
            }
            let offset = object_pos - worm_pos;
            let distance = offset.length();
            if distance == 0.0 {
                continue;
            }
            let min_distance = worm.radius() + object.radius();

            let push = offset / distance * (min_distance - distance) * WORM_PUSH_FACTOR;
            object.x = object.lane.clamp_x(object.x + px_to_percent(push.x, lane_width));
            object.y = (object.y + push.y).max(0.0);
        }
    }
}
