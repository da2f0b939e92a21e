//! Per-frame simulation tick
//!
//! Advances the session clock by one host frame and runs every phase in a
//! fixed order: due timers (spawns), target deadline, fall, worm movement,
//! lane collisions, worm collisions, then taps. Given the same seed and the
//! same inputs the result is identical.

use super::collision::{LaneCollisionOptions, apply_worm_object_collision, process_lane_collisions};
use super::events::GameEvent;
use super::input::TapGesture;
use super::session::Session;
use super::worms::{purge_dead, update_worm_positions};
use crate::Viewport;
use crate::consts::*;

/// Input gathered by the host since the previous frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Raw pointer gestures, filtered by the session's debouncer
    pub taps: Vec<TapGesture>,
    /// New viewport if the host was resized
    pub viewport: Option<Viewport>,
}

/// Advance the session by `dt_ms` of host time
pub fn tick(session: &mut Session, input: &TickInput, dt_ms: f64) {
    if let Some(viewport) = input.viewport {
        session.set_viewport(viewport);
    }

    let dt = if dt_ms.is_finite() {
        dt_ms.clamp(0.0, MAX_FRAME_MS)
    } else {
        0.0
    };
    session.now_ms += dt;

    if !session.state.is_playing() {
        return;
    }

    // Spawns land before collisions so new objects are separated this frame
    let mut failed = false;
    for kind in session.timers.pop_due(session.now_ms) {
        if let Err(err) = session.fire_timer(kind) {
            session.report(err);
            failed = true;
        }
    }
    if failed {
        return;
    }

    session.check_target_deadline();
    advance_objects(session, dt);

    let lane_mode = session.settings.lane_mode;
    update_worm_positions(
        &mut session.worms,
        dt as f32,
        session.worm_speed_multiplier,
        &session.viewport,
        lane_mode,
    );

    let options = LaneCollisionOptions {
        break_exact_overlaps: session.settings.break_exact_overlaps,
    };
    process_lane_collisions(&mut session.objects, options);
    apply_worm_object_collision(&session.worms, &mut session.objects, &session.viewport, lane_mode);

    for gesture in &input.taps {
        match session.debouncer.validate(gesture) {
            Ok(tap) => {
                session.handle_tap(tap);
            }
            Err(rejection) => log::debug!("Tap on {:?} rejected: {:?}", gesture.target, rejection),
        }
    }

    let purged = purge_dead(&mut session.worms);
    if purged > 0 {
        log::trace!("Purged {} dead worms", purged);
    }
}

/// Move objects down and drop the ones that left the bottom of the screen
fn advance_objects(session: &mut Session, dt: f64) {
    let frames = (dt / FRAME_MS) as f32;
    let floor = session.viewport.height;
    let target = session.state.target_identity().map(str::to_string);

    let mut missed = Vec::new();
    session.objects.retain_mut(|object| {
        object.y += object.speed * frames;
        if object.y > floor + object.size {
            missed.push(GameEvent::ObjectMissed {
                id: object.id,
                was_target: target.as_deref() == Some(object.identity.as_str()),
                identity: std::mem::take(&mut object.identity),
            });
            false
        } else {
            true
        }
    });

    for event in missed {
        session.emit(event);
    }
}
