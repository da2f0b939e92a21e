//! Spawn scheduling for falling objects
//!
//! Once per spawn tick the scheduler decides how many objects to add and
//! which items they show:
//! - the current target always gets up to `TARGET_GUARANTEE_COUNT` slots, and
//!   at least one whenever it has not been spawned for `TARGET_STARVATION_MS`
//! - decoys favour items that have not been on screen for a while
//! - the active count never exceeds `MAX_ACTIVE_OBJECTS`; objects near the
//!   bottom are pruned first when space runs low
//!
//! New positions are repaired greedily against nearby objects; whatever
//! overlap remains is handled by the per-frame lane collision pass.

use std::collections::{HashMap, HashSet};

use rand::Rng;
use rand::seq::IndexedRandom;

use super::SimError;
use super::category::{Category, CategoryItem};
use super::state::{FallingObject, Lane};
use crate::consts::*;
use crate::{IdGen, LaneMode, Viewport};

/// Read-only inputs for one spawn call
#[derive(Debug, Clone, Copy)]
pub struct SpawnContext<'a> {
    pub level: usize,
    pub category: &'a Category,
    pub target: &'a CategoryItem,
    pub now_ms: f64,
    pub viewport: Viewport,
    pub lane_mode: LaneMode,
    pub fall_speed_multiplier: f32,
}

/// What a spawn call changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpawnOutcome {
    /// Number of objects appended to the end of the list
    pub spawned: usize,
    /// Ids removed to make room
    pub pruned: Vec<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct SpawnScheduler {
    /// Last spawn of the current target; `None` forces the next tick
    last_target_spawn_ms: Option<f64>,
    /// Last time each identity was spawned
    last_appearance: HashMap<String, f64>,
    /// Objects spawned so far, drives lane alternation
    spawn_counter: usize,
}

impl SpawnScheduler {
    pub fn reset(&mut self) {
        self.last_target_spawn_ms = None;
        self.last_appearance.clear();
        self.spawn_counter = 0;
    }

    /// The target changed; its fairness window starts over
    pub fn mark_target_changed(&mut self) {
        self.last_target_spawn_ms = None;
    }

    pub fn last_target_spawn_ms(&self) -> Option<f64> {
        self.last_target_spawn_ms
    }

    pub fn last_appearance(&self, identity: &str) -> Option<f64> {
        self.last_appearance.get(identity).copied()
    }

    /// True when the target must be spawned this tick
    pub fn target_starved(&self, now_ms: f64) -> bool {
        self.last_target_spawn_ms
            .is_none_or(|t| now_ms - t > TARGET_STARVATION_MS)
    }

    fn is_stale(&self, identity: &str, now_ms: f64) -> bool {
        self.last_appearance
            .get(identity)
            .is_none_or(|&t| now_ms - t > STALE_EMOJI_MS)
    }

    /// Put one current-target object in every lane, shortly after a level starts
    pub fn spawn_immediate_targets<R: Rng + ?Sized>(
        &mut self,
        objects: &mut Vec<FallingObject>,
        ctx: &SpawnContext<'_>,
        ids: &mut IdGen,
        rng: &mut R,
    ) -> Result<SpawnOutcome, SimError> {
        if !ctx.target.is_well_formed() {
            return Err(SimError::MalformedTarget { level: ctx.level });
        }
        if objects.len() + 2 >= MAX_ACTIVE_OBJECTS {
            log::debug!("Immediate targets skipped: {} objects active", objects.len());
            return Ok(SpawnOutcome::default());
        }

        let mut batch: Vec<FallingObject> = Vec::new();
        for &lane in ctx.lane_mode.lanes() {
            if objects.len() + batch.len() >= MAX_ACTIVE_OBJECTS {
                break;
            }
            let (min, max) = lane.bounds();
            let x = rng.random_range(min..=max);
            let (x, y) = safe_spawn_position(x, -EMOJI_SIZE, lane, objects.iter().chain(batch.iter()));
            let speed = fall_speed(rng, ctx.fall_speed_multiplier);
            batch.push(FallingObject::new(ids.next_id(), ctx.target, lane, x, y, speed));
        }

        Ok(self.commit(objects, batch, ctx, Vec::new()))
    }

    /// Periodic batch spawn
    pub fn spawn_object<R: Rng + ?Sized>(
        &mut self,
        objects: &mut Vec<FallingObject>,
        ctx: &SpawnContext<'_>,
        ids: &mut IdGen,
        rng: &mut R,
    ) -> Result<SpawnOutcome, SimError> {
        // Validate before touching anything so a bad item leaves no trace
        if !ctx.target.is_well_formed() {
            return Err(SimError::MalformedTarget { level: ctx.level });
        }
        if let Some(index) = ctx.category.items.iter().position(|i| !i.is_well_formed()) {
            return Err(SimError::MalformedItem {
                level: ctx.level,
                index,
            });
        }

        let force_target = self.target_starved(ctx.now_ms);
        let mut pruned = prune_overflow(objects, ctx.target, &ctx.viewport);

        let available = MAX_ACTIVE_OBJECTS.saturating_sub(objects.len());
        let mut count = available.min(SPAWN_COUNT);
        if count == 0 && force_target {
            if let Some(id) = evict_lowest_decoy(objects, ctx.target) {
                pruned.push(id);
                count = 1;
            }
        }
        if count == 0 {
            return Ok(SpawnOutcome {
                spawned: 0,
                pruned,
            });
        }

        let on_screen_targets = objects.iter().filter(|o| o.is(ctx.target)).count();
        let mut target_slots = TARGET_GUARANTEE_COUNT.saturating_sub(on_screen_targets);
        if force_target {
            target_slots = target_slots.max(1);
        }
        let target_slots = target_slots.min(count);

        let mut items: Vec<CategoryItem> = vec![ctx.target.clone(); target_slots];
        items.extend(self.pick_decoys(count - target_slots, objects.as_slice(), ctx, rng));

        let mut batch: Vec<FallingObject> = Vec::with_capacity(items.len());
        for item in &items {
            let lane = ctx.lane_mode.lane_for_index(self.spawn_counter);
            self.spawn_counter += 1;

            let (min, max) = lane.bounds();
            let x = rng.random_range(min..=max);
            let y = -EMOJI_SIZE - rng.random_range(0.0..SPAWN_Y_JITTER);
            let (x, y) = safe_spawn_position(x, y, lane, objects.iter().chain(batch.iter()));
            let speed = fall_speed(rng, ctx.fall_speed_multiplier);
            batch.push(FallingObject::new(ids.next_id(), item, lane, x, y, speed));
        }

        log::debug!(
            "Spawn batch: {} objects ({} target, forced={}), {} pruned, {} active",
            batch.len(),
            target_slots,
            force_target,
            pruned.len(),
            objects.len() + batch.len()
        );

        Ok(self.commit(objects, batch, ctx, pruned))
    }

    /// Choose `count` non-target items for a batch.
    ///
    /// Stale items win 70% of the time, an identity is never used twice in a
    /// batch, and identities already on screen are passed over unless a 30%
    /// roll allows them. Passed-over items fill in only when nothing else is
    /// left.
    fn pick_decoys<R: Rng + ?Sized>(
        &self,
        count: usize,
        objects: &[FallingObject],
        ctx: &SpawnContext<'_>,
        rng: &mut R,
    ) -> Vec<CategoryItem> {
        let on_screen: HashSet<&str> = objects.iter().map(|o| o.identity.as_str()).collect();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut candidates: Vec<&CategoryItem> = ctx
            .category
            .items
            .iter()
            .filter(|i| i.identity != ctx.target.identity && seen.insert(i.identity.as_str()))
            .collect();

        let mut picked: Vec<CategoryItem> = Vec::with_capacity(count);
        let mut passed_over: Vec<&CategoryItem> = Vec::new();

        while picked.len() < count && !candidates.is_empty() {
            let stale: Vec<usize> = candidates
                .iter()
                .enumerate()
                .filter(|(_, item)| self.is_stale(&item.identity, ctx.now_ms))
                .map(|(i, _)| i)
                .collect();

            let index = match stale.choose(rng) {
                Some(&i) if rng.random_bool(STALE_PICK_CHANCE) => i,
                _ => rng.random_range(0..candidates.len()),
            };
            let item = candidates.swap_remove(index);

            if on_screen.contains(item.identity.as_str()) && !rng.random_bool(DUPLICATE_ALLOW_CHANCE) {
                passed_over.push(item);
                continue;
            }
            picked.push(item.clone());
        }

        for item in passed_over {
            if picked.len() >= count {
                break;
            }
            picked.push(item.clone());
        }

        picked
    }

    fn commit(
        &mut self,
        objects: &mut Vec<FallingObject>,
        batch: Vec<FallingObject>,
        ctx: &SpawnContext<'_>,
        pruned: Vec<u32>,
    ) -> SpawnOutcome {
        for object in &batch {
            self.last_appearance.insert(object.identity.clone(), ctx.now_ms);
            if object.is(ctx.target) {
                self.last_target_spawn_ms = Some(ctx.now_ms);
            }
        }
        let spawned = batch.len();
        objects.extend(batch);
        SpawnOutcome { spawned, pruned }
    }
}

fn fall_speed<R: Rng + ?Sized>(rng: &mut R, multiplier: f32) -> f32 {
    rng.random_range(MIN_FALL_SPEED..MAX_FALL_SPEED) * multiplier
}

/// Remove objects near the bottom until there is headroom for a batch.
///
/// Decoys go first, lowest on screen first. Targets are only removed while
/// more than `TARGET_GUARANTEE_COUNT` of them are on screen.
pub fn prune_overflow(
    objects: &mut Vec<FallingObject>,
    target: &CategoryItem,
    viewport: &Viewport,
) -> Vec<u32> {
    let limit = MAX_ACTIVE_OBJECTS - (TARGET_GUARANTEE_COUNT + MIN_DECOY_SLOTS);
    if objects.len() <= limit {
        return Vec::new();
    }

    let cutoff = viewport.height * PRUNE_HEIGHT_FRACTION;
    let mut candidates: Vec<(bool, f32, u32)> = objects
        .iter()
        .filter(|o| o.y > cutoff)
        .map(|o| (o.is(target), o.y, o.id))
        .collect();
    candidates.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.total_cmp(&a.1)));

    let mut targets_on_screen = objects.iter().filter(|o| o.is(target)).count();
    let mut excess = objects.len() - limit;
    let mut removed = Vec::new();

    for (is_target, _, id) in candidates {
        if excess == 0 {
            break;
        }
        if is_target {
            if targets_on_screen <= TARGET_GUARANTEE_COUNT {
                continue;
            }
            targets_on_screen -= 1;
        }
        removed.push(id);
        excess -= 1;
    }

    objects.retain(|o| !removed.contains(&o.id));
    removed
}

/// Drop the lowest non-target object to make room for a forced target
fn evict_lowest_decoy(objects: &mut Vec<FallingObject>, target: &CategoryItem) -> Option<u32> {
    let index = objects
        .iter()
        .enumerate()
        .filter(|(_, o)| !o.is(target))
        .max_by(|a, b| a.1.y.total_cmp(&b.1.y))
        .map(|(i, _)| i)?;
    Some(objects.remove(index).id)
}

/// Nudge a spawn point away from same-lane objects still near the top.
///
/// A neighbour that is both vertically and horizontally too close pushes the
/// point sideways by `HORIZONTAL_SEPARATION`, trying the other side when a lane
/// bound is in the way. If the point still sits on top of a neighbour after
/// that, it moves up to `MIN_VERTICAL_GAP` above it, lowest neighbour first.
pub fn safe_spawn_position<'a>(
    x: f32,
    y: f32,
    lane: Lane,
    neighbours: impl Iterator<Item = &'a FallingObject>,
) -> (f32, f32) {
    let too_close = |x: f32, y: f32, other: &FallingObject| {
        (other.y - y).abs() < MIN_VERTICAL_GAP && (x - other.x).abs() < HORIZONTAL_SEPARATION
    };

    let mut nearby: Vec<&FallingObject> = neighbours
        .filter(|o| o.lane == lane && o.y < SPAWN_ZONE_Y)
        .collect();
    let mut x = lane.clamp_x(x);
    let mut y = y;

    for &other in &nearby {
        if !too_close(x, y, other) {
            continue;
        }
        let dir = if x >= other.x { 1.0 } else { -1.0 };
        x = lane.clamp_x(other.x + dir * HORIZONTAL_SEPARATION);
        if (x - other.x).abs() < HORIZONTAL_SEPARATION {
            x = lane.clamp_x(other.x - dir * HORIZONTAL_SEPARATION);
        }
    }

    nearby.sort_by(|a, b| b.y.total_cmp(&a.y));
    for other in nearby {
        if too_close(x, y, other) {
            y = other.y - MIN_VERTICAL_GAP;
        }
    }

    (x, y)
}
