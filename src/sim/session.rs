//! Game session: owns every mutable collection and drives the state machine
//!
//! `Session` is the simulation context. Objects, worms, the target pool, the
//! timer queue and the tap filter all live here by value, so starting or
//! resetting a game is a single teardown of this struct. Timers are always
//! cleared before new ones are scheduled.

use std::collections::VecDeque;

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::SimError;
use super::category::Categories;
use super::events::{EventSink, GameEvent};
use super::input::{TapDebouncer, TapEvent, TapTarget};
use super::spawn::{SpawnContext, SpawnScheduler};
use super::state::{FallingObject, GameState, Worm};
use super::target_pool::TargetPool;
use super::timers::{TimerKind, TimerQueue};
use super::worms::create_worms;
use crate::consts::*;
use crate::{IdGen, Settings, Viewport};

/// Result of resolving one tap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TapOutcome {
    /// Not playing, unknown id, or the other player's lane
    Ignored,
    Correct,
    Incorrect,
    WormKilled,
}

/// Read-only copy of everything a renderer needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub now_ms: f64,
    pub level_name: String,
    pub state: GameState,
    pub objects: Vec<FallingObject>,
    pub worms: Vec<Worm>,
}

pub struct Session {
    pub(crate) settings: Settings,
    pub(crate) categories: Categories,
    pub(crate) state: GameState,
    pub(crate) objects: Vec<FallingObject>,
    pub(crate) worms: Vec<Worm>,
    pub(crate) pool: TargetPool,
    pub(crate) scheduler: SpawnScheduler,
    pub(crate) timers: TimerQueue,
    pub(crate) debouncer: TapDebouncer,
    pub(crate) rng: Pcg32,
    pub(crate) ids: IdGen,
    pub(crate) viewport: Viewport,
    pub(crate) worm_speed_multiplier: f32,
    /// Worms created this game, keeps lane alternation across waves
    pub(crate) worms_created: usize,
    /// Session clock (ms), advanced only by `tick`
    pub(crate) now_ms: f64,
    /// Undrained events, oldest first, capped at `MAX_BUFFERED_EVENTS`
    events: VecDeque<GameEvent>,
    events_dropped: bool,
    sinks: Vec<Box<dyn EventSink>>,
}

impl Session {
    pub fn new(settings: Settings, categories: Categories) -> Self {
        let settings = settings.sanitized();
        let seed = settings.seed.unwrap_or_default();
        Self {
            categories,
            state: GameState::default(),
            objects: Vec::new(),
            worms: Vec::new(),
            pool: TargetPool::new(settings.avoid_repeat_on_refill),
            scheduler: SpawnScheduler::default(),
            timers: TimerQueue::default(),
            debouncer: TapDebouncer::default(),
            rng: Pcg32::seed_from_u64(seed),
            ids: IdGen::default(),
            viewport: settings.viewport,
            worm_speed_multiplier: settings.worm_speed_multiplier,
            worms_created: 0,
            now_ms: 0.0,
            events: VecDeque::new(),
            events_dropped: false,
            sinks: Vec::new(),
            settings,
        }
    }

    /// Register a telemetry/audio sink
    pub fn with_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.add_sink(Box::new(sink));
        self
    }

    pub fn add_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        for sink in &mut self.sinks {
            sink.record(&event);
        }
        if self.events.len() >= MAX_BUFFERED_EVENTS {
            if !self.events_dropped {
                log::warn!(
                    "Event buffer full ({} events), dropping oldest until drained",
                    MAX_BUFFERED_EVENTS
                );
                self.events_dropped = true;
            }
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub(crate) fn report(&mut self, error: SimError) {
        log::error!("Tick aborted: {}", error);
        self.emit(GameEvent::Error {
            message: error.to_string(),
        });
    }

    /// Take the events emitted since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.events_dropped = false;
        self.events.drain(..).collect()
    }

    /// Events waiting for `drain_events`
    pub fn buffered_events(&self) -> usize {
        self.events.len()
    }

    // === State machine ===

    /// Start (or restart) play at `level`
    pub fn start_game(&mut self, level: usize) {
        // Clear-before-start: nothing from a previous game may fire again
        self.timers.clear();

        let clamped = self.categories.clamp_level(level);
        if clamped != level {
            log::warn!("Level {} out of range, starting level {}", level, clamped);
        }

        self.pool.clear();
        self.scheduler.reset();
        self.debouncer.reset();
        self.objects.clear();
        self.worms.clear();
        self.worms_created = 0;

        let category = self.categories.get(clamped);
        let target = self.pool.draw_next(category, &mut self.rng);
        log::info!(
            "Starting level {} ({}), target {:?}",
            clamped,
            category.name,
            target.as_ref().map(|t| t.identity.as_str())
        );

        self.state = GameState {
            level: clamped,
            current_target: target.clone(),
            progress: 0,
            streak: 0,
            game_started: true,
            winner: false,
            target_change_time: self.now_ms + TARGET_CHANGE_INTERVAL_MS,
            targets_destroyed: 0,
        };

        let now = self.now_ms;
        self.timers
            .schedule_once(TimerKind::ImmediateTargets, now, IMMEDIATE_SPAWN_DELAY_MS);
        self.timers
            .schedule_every(TimerKind::SpawnObjects, now, SPAWN_INTERVAL_MS);
        if self.settings.worms_enabled {
            for i in 0..WORM_INITIAL_COUNT {
                let delay = i as f64 * WORM_PROGRESSIVE_SPAWN_INTERVAL_MS;
                self.timers.schedule_once(TimerKind::ProgressiveWorm, now, delay);
            }
            self.timers
                .schedule_every(TimerKind::RecurringWorms, now, WORM_RECURRING_INTERVAL_MS);
        }

        self.emit(GameEvent::GameStarted { level: clamped });
        match target {
            Some(t) => self.emit(GameEvent::TargetChanged {
                identity: t.identity,
                glyph: t.glyph,
            }),
            None => self.report(SimError::NoTarget { level: clamped }),
        }
    }

    /// Back to idle: every timer cancelled, every collection emptied
    pub fn reset_game(&mut self) {
        self.timers.clear();
        self.objects.clear();
        self.worms.clear();
        self.pool.clear();
        self.scheduler.reset();
        self.debouncer.reset();
        self.worm_speed_multiplier = 1.0;
        self.worms_created = 0;
        self.state = GameState::default();
        log::info!("Game reset");
        self.emit(GameEvent::GameReset);
    }

    /// Run one fired timer
    pub(crate) fn fire_timer(&mut self, kind: TimerKind) -> Result<(), SimError> {
        match kind {
            TimerKind::ImmediateTargets => self.run_spawn(true),
            TimerKind::SpawnObjects => self.run_spawn(false),
            TimerKind::ProgressiveWorm => {
                self.spawn_worms(1);
                Ok(())
            }
            TimerKind::RecurringWorms => {
                self.spawn_worms(WORM_RECURRING_COUNT);
                Ok(())
            }
        }
    }

    fn run_spawn(&mut self, immediate: bool) -> Result<(), SimError> {
        let level = self.state.level;
        let Some(target) = self.state.current_target.as_ref() else {
            return Err(SimError::NoTarget { level });
        };
        let target_identity = target.identity.clone();

        let ctx = SpawnContext {
            level,
            category: self.categories.get(level),
            target,
            now_ms: self.now_ms,
            viewport: self.viewport,
            lane_mode: self.settings.lane_mode,
            fall_speed_multiplier: self.settings.fall_speed_multiplier,
        };
        let outcome = if immediate {
            self.scheduler
                .spawn_immediate_targets(&mut self.objects, &ctx, &mut self.ids, &mut self.rng)?
        } else {
            self.scheduler
                .spawn_object(&mut self.objects, &ctx, &mut self.ids, &mut self.rng)?
        };

        let first_new = self.objects.len() - outcome.spawned;
        let events: Vec<GameEvent> = outcome
            .pruned
            .iter()
            .map(|&id| GameEvent::ObjectPruned { id })
            .chain(self.objects.iter().skip(first_new).map(|o| GameEvent::ObjectSpawned {
                id: o.id,
                identity: o.identity.clone(),
                lane: o.lane,
                is_target: o.identity == target_identity,
            }))
            .collect();
        for event in events {
            self.emit(event);
        }
        Ok(())
    }

    fn spawn_worms(&mut self, count: usize) {
        if !self.settings.worms_enabled {
            return;
        }
        let worms = create_worms(
            count,
            self.worms_created,
            &mut self.ids,
            &mut self.rng,
            &self.viewport,
            self.settings.lane_mode,
        );
        self.worms_created += count;
        for worm in worms {
            self.emit(GameEvent::WormSpawned {
                id: worm.id,
                lane: worm.lane,
            });
            self.worms.push(worm);
        }
    }

    /// Announce the next target and restart its deadline and fairness window
    pub(crate) fn rotate_target(&mut self) {
        let category = self.categories.get(self.state.level);
        let next = self.pool.draw_next(category, &mut self.rng);
        self.state.target_change_time = self.now_ms + TARGET_CHANGE_INTERVAL_MS;
        self.scheduler.mark_target_changed();

        match next {
            Some(target) => {
                self.state.current_target = Some(target.clone());
                self.emit(GameEvent::TargetChanged {
                    identity: target.identity,
                    glyph: target.glyph,
                });
            }
            None => {
                let level = self.state.level;
                self.report(SimError::NoTarget { level });
            }
        }
    }

    /// Rotate the target once its deadline passes
    pub(crate) fn check_target_deadline(&mut self) {
        if self.state.is_playing() && self.now_ms >= self.state.target_change_time {
            self.rotate_target();
        }
    }

    // === Tap resolution ===

    /// Resolve a validated tap
    pub fn handle_tap(&mut self, tap: TapEvent) -> TapOutcome {
        if !self.state.is_playing() {
            return TapOutcome::Ignored;
        }

        match tap.target {
            TapTarget::Worm(id) => {
                let Some(worm) = self.worms.iter_mut().find(|w| w.id == id && w.alive) else {
                    return TapOutcome::Ignored;
                };
                worm.alive = false;
                self.emit(GameEvent::WormKilled { id });
                TapOutcome::WormKilled
            }
            TapTarget::Object(id) => {
                let Some(index) = self.objects.iter().position(|o| o.id == id) else {
                    return TapOutcome::Ignored;
                };
                if tap.lane.is_some_and(|lane| lane != self.objects[index].lane) {
                    return TapOutcome::Ignored;
                }

                let object = self.objects.remove(index);
                let correct = self.state.target_identity() == Some(object.identity.as_str());
                self.emit(GameEvent::ObjectTapped {
                    id,
                    identity: object.identity,
                    correct,
                });

                if correct {
                    self.on_correct_tap();
                    TapOutcome::Correct
                } else {
                    self.state.remove_progress(PROGRESS_PENALTY);
                    self.state.streak = 0;
                    TapOutcome::Incorrect
                }
            }
        }
    }

    fn on_correct_tap(&mut self) {
        self.state.add_progress(PROGRESS_PER_CORRECT);
        self.state.streak += 1;

        if self.state.progress >= PROGRESS_MAX {
            if self.settings.continuous_mode {
                self.state.progress = 0;
                self.state.targets_destroyed += 1;
                let targets_destroyed = self.state.targets_destroyed;
                self.emit(GameEvent::RoundCompleted { targets_destroyed });
                if targets_destroyed % TARGETS_PER_LEVEL == 0 {
                    self.advance_level();
                    return;
                }
            } else {
                self.state.winner = true;
                self.timers.clear();
                log::info!("Level {} won", self.state.level);
                self.emit(GameEvent::Won);
                return;
            }
        }

        if self.categories.get(self.state.level).requires_sequence {
            self.rotate_target();
        }
    }

    /// Continuous mode: move to the next level with a fresh pool
    fn advance_level(&mut self) {
        let level = self.categories.next_level(self.state.level);
        self.state.level = level;

        self.pool.clear();
        let category = self.categories.get(level);
        self.pool.refill(category, &mut self.rng);
        log::info!("Advancing to level {} ({})", level, category.name);

        self.emit(GameEvent::LevelAdvanced { level });
        self.rotate_target();
        self.timers
            .schedule_once(TimerKind::ImmediateTargets, self.now_ms, IMMEDIATE_SPAWN_DELAY_MS);
    }

    // === Host surface ===

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn objects(&self) -> &[FallingObject] {
        &self.objects
    }

    pub fn worms(&self) -> &[Worm] {
        &self.worms
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn categories(&self) -> &Categories {
        &self.categories
    }

    pub fn target_pool(&self) -> &TargetPool {
        &self.pool
    }

    pub fn scheduler(&self) -> &SpawnScheduler {
        &self.scheduler
    }

    pub fn timers(&self) -> &TimerQueue {
        &self.timers
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport.sanitized();
    }

    pub fn worm_speed_multiplier(&self) -> f32 {
        self.worm_speed_multiplier
    }

    pub fn set_worm_speed_multiplier(&mut self, multiplier: f32) {
        self.worm_speed_multiplier = if multiplier.is_finite() {
            multiplier.clamp(0.0, MAX_WORM_SPEED_MULTIPLIER)
        } else {
            1.0
        };
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            now_ms: self.now_ms,
            level_name: self.categories.get(self.state.level).name.clone(),
            state: self.state.clone(),
            objects: self.objects.clone(),
            worms: self.worms.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::category::{Category, CategoryItem};
    use crate::sim::events::{AudioCueQueue, LogSink};
    use crate::sim::state::{GamePhase, Lane};
    use crate::sim::tick::{TickInput, tick};
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn settings(seed: u64) -> Settings {
        Settings {
            seed: Some(seed),
            ..Settings::default()
        }
    }

    fn session(seed: u64) -> Session {
        Session::new(settings(seed), Categories::default())
    }

    /// Put an object on screen and return its id
    fn place(session: &mut Session, identity: &str) -> u32 {
        let id = session.ids.next_id();
        let item = CategoryItem::new(identity, "?");
        session
            .objects
            .push(FallingObject::new(id, &item, Lane::Left, 50.0, 100.0, 1.0));
        id
    }

    fn target_of(session: &Session) -> String {
        session
            .state
            .target_identity()
            .map(str::to_string)
            .expect("target selected")
    }

    fn tap_target(session: &mut Session) -> TapOutcome {
        let target = target_of(session);
        let id = place(session, &target);
        session.handle_tap(TapEvent::object(id))
    }

    #[test]
    fn test_start_game_initial_state() {
        let mut s = session(1);
        s.start_game(0);
        assert_eq!(s.state.phase(), GamePhase::Playing);
        assert_eq!(s.state.level, 0);
        assert_eq!(s.state.progress, 0);
        assert_eq!(s.state.target_change_time, TARGET_CHANGE_INTERVAL_MS);
        assert_eq!(s.pool.remaining(), 8);
        assert_eq!(s.timers.count(TimerKind::ImmediateTargets), 1);
        assert_eq!(s.timers.count(TimerKind::SpawnObjects), 1);
        assert_eq!(s.timers.count(TimerKind::ProgressiveWorm), WORM_INITIAL_COUNT);
        assert_eq!(s.timers.count(TimerKind::RecurringWorms), 1);

        let events = s.drain_events();
        assert_eq!(events[0], GameEvent::GameStarted { level: 0 });
        assert!(matches!(events[1], GameEvent::TargetChanged { .. }));
    }

    #[test]
    fn test_level_index_is_clamped() {
        let mut s = session(1);
        s.start_game(99);
        assert_eq!(s.state.level, s.categories.len() - 1);
    }

    #[test]
    fn test_sequence_level_restarts_cursor() {
        let mut s = session(2);
        s.start_game(1);
        assert_eq!(target_of(&s), "1");
        tap_target(&mut s);
        assert_eq!(target_of(&s), "2");
        s.start_game(1);
        assert_eq!(target_of(&s), "1");
    }

    #[test]
    fn test_correct_and_incorrect_taps() {
        let mut s = session(3);
        s.start_game(0);
        assert_eq!(tap_target(&mut s), TapOutcome::Correct);
        assert_eq!(tap_target(&mut s), TapOutcome::Correct);
        assert_eq!(s.state.progress, 2 * PROGRESS_PER_CORRECT);
        assert_eq!(s.state.streak, 2);

        let wrong = place(&mut s, "not-a-fruit");
        assert_eq!(s.handle_tap(TapEvent::object(wrong)), TapOutcome::Incorrect);
        assert_eq!(s.state.progress, 2 * PROGRESS_PER_CORRECT - PROGRESS_PENALTY);
        assert_eq!(s.state.streak, 0);
        assert!(s.objects.iter().all(|o| o.id != wrong));

        // Already removed
        assert_eq!(s.handle_tap(TapEvent::object(wrong)), TapOutcome::Ignored);
    }

    #[test]
    fn test_tap_from_other_lane_is_ignored() {
        let mut s = session(3);
        s.start_game(0);
        let target = target_of(&s);
        let id = place(&mut s, &target);
        let tap = TapEvent {
            target: TapTarget::Object(id),
            lane: Some(Lane::Right),
        };
        assert_eq!(s.handle_tap(tap), TapOutcome::Ignored);
        assert_eq!(s.objects.len(), 1);
    }

    #[test]
    fn test_win_in_standard_mode() {
        let mut s = session(4);
        s.start_game(0);
        for _ in 0..(PROGRESS_MAX / PROGRESS_PER_CORRECT) {
            assert_eq!(tap_target(&mut s), TapOutcome::Correct);
        }
        assert!(s.state.winner);
        assert_eq!(s.state.phase(), GamePhase::Won);
        assert_eq!(s.state.progress, PROGRESS_MAX);
        assert_eq!(s.pending_timers(), 0);
        assert!(s.drain_events().contains(&GameEvent::Won));

        // Terminal: taps do nothing until a new game
        let id = place(&mut s, "apple");
        assert_eq!(s.handle_tap(TapEvent::object(id)), TapOutcome::Ignored);
    }

    #[test]
    fn test_continuous_mode_advances_level_after_ten_rounds() {
        let mut s = Session::new(
            Settings {
                continuous_mode: true,
                ..settings(5)
            },
            Categories::default(),
        );
        s.start_game(0);
        for round in 1..=TARGETS_PER_LEVEL {
            s.state.progress = PROGRESS_MAX - PROGRESS_PER_CORRECT;
            assert_eq!(tap_target(&mut s), TapOutcome::Correct);
            assert_eq!(s.state.progress, 0);
            assert!(!s.state.winner);
            if round < TARGETS_PER_LEVEL {
                assert_eq!(s.state.level, 0);
            }
        }
        assert_eq!(s.state.level, 1);
        assert_eq!(s.state.targets_destroyed, TARGETS_PER_LEVEL);
        // Level 1 is a counting level: the cursor restarted with the new level
        assert_eq!(target_of(&s), "1");
        assert_eq!(s.pool.sequence_index(), 1);
        assert!(s.drain_events().contains(&GameEvent::LevelAdvanced { level: 1 }));
        assert_eq!(s.timers.count(TimerKind::ImmediateTargets), 1);
    }

    #[test]
    fn test_continuous_mode_refills_pool_for_new_level() {
        let item = |n: &str| CategoryItem::new(n, n);
        let categories = Categories::new(vec![
            Category {
                name: "one".into(),
                items: vec![item("a"), item("b")],
                requires_sequence: false,
            },
            Category {
                name: "two".into(),
                items: vec![item("x"), item("y"), item("z")],
                requires_sequence: false,
            },
        ])
        .expect("valid categories");
        let mut s = Session::new(
            Settings {
                continuous_mode: true,
                ..settings(6)
            },
            categories,
        );
        s.start_game(0);
        for _ in 0..TARGETS_PER_LEVEL {
            s.state.progress = PROGRESS_MAX - PROGRESS_PER_CORRECT;
            tap_target(&mut s);
        }
        assert_eq!(s.state.level, 1);
        assert!(["x", "y", "z"].contains(&target_of(&s).as_str()));
        assert_eq!(s.pool.remaining(), 2);

        // And it wraps back to the first level
        for _ in 0..TARGETS_PER_LEVEL {
            s.state.progress = PROGRESS_MAX - PROGRESS_PER_CORRECT;
            tap_target(&mut s);
        }
        assert_eq!(s.state.level, 0);
    }

    #[test]
    fn test_worm_tap_kills_once() {
        let mut s = session(7);
        s.start_game(0);
        s.spawn_worms(2);
        let id = s.worms[0].id;
        assert_eq!(s.handle_tap(TapEvent::worm(id)), TapOutcome::WormKilled);
        assert!(!s.worms[0].alive);
        assert_eq!(s.handle_tap(TapEvent::worm(id)), TapOutcome::Ignored);
        assert_eq!(s.state.progress, 0);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut s = session(8);
        s.start_game(2);
        s.spawn_worms(3);
        s.set_worm_speed_multiplier(2.5);
        tap_target(&mut s);

        s.reset_game();
        let first = s.state.clone();
        s.reset_game();
        assert_eq!(s.state, first);
        assert_eq!(s.state, GameState::default());
        assert_eq!(s.state.phase(), GamePhase::Idle);
        assert_eq!(s.pending_timers(), 0);
        assert!(s.objects.is_empty());
        assert!(s.worms.is_empty());
        assert_eq!(s.pool.remaining(), 0);
        assert_eq!(s.worm_speed_multiplier(), 1.0);
    }

    #[test]
    fn test_restart_does_not_duplicate_worm_waves() {
        let mut s = session(9);
        s.start_game(0);
        s.start_game(1);
        assert_eq!(s.timers.count(TimerKind::ProgressiveWorm), WORM_INITIAL_COUNT);
        assert_eq!(s.timers.count(TimerKind::RecurringWorms), 1);
        assert_eq!(s.timers.count(TimerKind::SpawnObjects), 1);
        s.drain_events();

        let input = TickInput::default();
        let mut spawned_worms = 0;
        while s.now_ms() < WORM_RECURRING_INTERVAL_MS + 100.0 {
            tick(&mut s, &input, FRAME_MS);
            spawned_worms += s
                .drain_events()
                .iter()
                .filter(|e| matches!(e, GameEvent::WormSpawned { .. }))
                .count();
        }
        assert_eq!(spawned_worms, WORM_INITIAL_COUNT + WORM_RECURRING_COUNT);
        assert_eq!(s.worms.len(), WORM_INITIAL_COUNT + WORM_RECURRING_COUNT);
        assert_eq!(s.state.level, 1);
    }

    #[test]
    fn test_worms_disabled() {
        let mut s = Session::new(
            Settings {
                worms_enabled: false,
                ..settings(10)
            },
            Categories::default(),
        );
        s.start_game(0);
        assert_eq!(s.timers.count(TimerKind::ProgressiveWorm), 0);
        assert_eq!(s.timers.count(TimerKind::RecurringWorms), 0);
    }

    #[test]
    fn test_sinks_receive_events() {
        let cues = Rc::new(RefCell::new(AudioCueQueue::default()));
        let mut s = session(11).with_sink(cues.clone());
        s.start_game(0);
        tap_target(&mut s);
        let wrong = place(&mut s, "nope");
        s.handle_tap(TapEvent::object(wrong));
        use crate::sim::events::AudioCue;
        assert_eq!(
            cues.borrow_mut().drain(),
            vec![AudioCue::Correct, AudioCue::Incorrect]
        );
    }

    #[test]
    fn test_undrained_event_buffer_is_bounded() {
        let mut s = Session::new(settings(1), Categories::default()).with_sink(LogSink);
        s.start_game(0);
        let input = TickInput::default();
        while s.now_ms() < 600_000.0 {
            tick(&mut s, &input, FRAME_MS);
            assert!(s.buffered_events() <= MAX_BUFFERED_EVENTS);
        }
        assert_eq!(s.buffered_events(), MAX_BUFFERED_EVENTS);

        // Oldest are gone, the buffer refills from empty after a drain
        let events = s.drain_events();
        assert_eq!(events.len(), MAX_BUFFERED_EVENTS);
        assert_ne!(events[0], GameEvent::GameStarted { level: 0 });
        assert_eq!(s.buffered_events(), 0);
        s.reset_game();
        assert_eq!(s.drain_events(), vec![GameEvent::GameReset]);
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut s = session(12);
        s.start_game(0);
        place(&mut s, "apple");
        let snapshot = s.snapshot();
        assert_eq!(snapshot.level_name, "Fruits & Vegetables");
        let json = serde_json::to_string(&snapshot).expect("serializable");
        let back: Snapshot = serde_json::from_str(&json).expect("round trip");
        assert_eq!(back.objects.len(), 1);
        assert_eq!(back.state, s.state);
    }

    proptest! {
        #[test]
        fn prop_progress_stays_in_bounds(
            seed in any::<u64>(),
            taps in proptest::collection::vec(any::<bool>(), 0..60),
            continuous in any::<bool>(),
        ) {
            let mut s = Session::new(
                Settings { continuous_mode: continuous, ..settings(seed) },
                Categories::default(),
            );
            s.start_game(0);
            for correct in taps {
                let was_playing = s.state.is_playing();
                let outcome = if correct {
                    tap_target(&mut s)
                } else {
                    let id = place(&mut s, "definitely-wrong");
                    s.handle_tap(TapEvent::object(id))
                };
                prop_assert!(s.state.progress <= PROGRESS_MAX);
                if !was_playing {
                    prop_assert_eq!(outcome, TapOutcome::Ignored);
                }
                if continuous {
                    prop_assert!(!s.state.winner);
                    prop_assert!(s.state.progress < PROGRESS_MAX);
                } else if s.state.progress == PROGRESS_MAX {
                    prop_assert!(s.state.winner);
                }
            }
        }
    }
}
