//! Emoji Race entry point
//!
//! The browser build is driven through `emoji_race::web`. Natively this runs a
//! headless game with a simple auto-tapper and prints a summary, which is handy
//! for tuning spawn and collision constants.
//!
//! Usage: `emoji-race [settings.json] [categories.json] [level]`

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::path::Path;
    use std::time::{SystemTime, UNIX_EPOCH};

    use emoji_race::Settings;
    use emoji_race::consts::*;
    use emoji_race::sim::{
        Categories, GameEvent, LogSink, Session, TapGesture, TapTarget, TickInput, tick,
    };

    /// Simulated session length
    const RUN_MS: f64 = 180_000.0;
    /// Bot reaction time between taps
    const BOT_TAP_INTERVAL_MS: f64 = 450.0;
    /// Every n-th bot tap deliberately hits a decoy
    const BOT_MISTAKE_EVERY: u32 = 6;

    #[derive(Debug, Default)]
    struct Summary {
        spawned: usize,
        target_spawns: usize,
        correct: usize,
        incorrect: usize,
        missed_targets: usize,
        pruned: usize,
        worms_killed: usize,
        target_changes: usize,
        peak_objects: usize,
        errors: usize,
    }

    impl Summary {
        fn record(&mut self, event: &GameEvent) {
            match event {
                GameEvent::ObjectSpawned { is_target, .. } => {
                    self.spawned += 1;
                    if *is_target {
                        self.target_spawns += 1;
                    }
                }
                GameEvent::ObjectTapped { correct: true, .. } => self.correct += 1,
                GameEvent::ObjectTapped { correct: false, .. } => self.incorrect += 1,
                GameEvent::ObjectMissed { was_target: true, .. } => self.missed_targets += 1,
                GameEvent::ObjectPruned { .. } => self.pruned += 1,
                GameEvent::WormKilled { .. } => self.worms_killed += 1,
                GameEvent::TargetChanged { .. } => self.target_changes += 1,
                GameEvent::Error { .. } => self.errors += 1,
                _ => {}
            }
        }
    }

    /// Pick the next tap: the lowest visible target, or a decoy when it's time
    /// for a mistake. Kills a worm every so often.
    fn bot_tap(session: &Session, taps_made: u32) -> Option<TapTarget> {
        if taps_made % 10 == 9 {
            if let Some(worm) = session.worms().first() {
                return Some(TapTarget::Worm(worm.id));
            }
        }

        let target = session.state().target_identity()?;
        let mistake = taps_made % BOT_MISTAKE_EVERY == BOT_MISTAKE_EVERY - 1;
        session
            .objects()
            .iter()
            .filter(|o| o.y >= 0.0 && (o.identity == target) != mistake)
            .max_by(|a, b| a.y.total_cmp(&b.y))
            .map(|o| TapTarget::Object(o.id))
    }

    /// Fill in a clock seed when the settings leave it to the host
    fn with_seed(mut settings: Settings) -> Settings {
        if settings.seed.is_none() {
            let seed = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or_default();
            log::info!("Seeding from clock: {}", seed);
            settings.seed = Some(seed);
        }
        settings
    }

    pub fn run() {
        let mut args = std::env::args().skip(1);

        let settings = match args.next() {
            Some(path) => with_seed(Settings::load(Path::new(&path))),
            None => Settings {
                seed: Some(42),
                ..Settings::default()
            },
        };

        let categories = match args.next() {
            Some(path) => match std::fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|json| Categories::from_json(&json).map_err(|e| e.to_string()))
            {
                Ok(categories) => categories,
                Err(e) => {
                    log::warn!("Using built-in categories, could not load {}: {}", path, e);
                    Categories::default()
                }
            },
            None => Categories::default(),
        };

        let level = args.next().and_then(|s| s.parse().ok()).unwrap_or(0);

        log::info!(
            "Headless run: level {}, lanes {}, continuous {}",
            level,
            settings.lane_mode.as_str(),
            settings.continuous_mode
        );

        let mut session = Session::new(settings, categories).with_sink(LogSink);
        session.start_game(level);

        let mut summary = Summary::default();
        let mut taps_made = 0u32;
        let mut next_tap_ms = BOT_TAP_INTERVAL_MS;

        while session.now_ms() < RUN_MS && session.state().is_playing() {
            let mut input = TickInput::default();
            if session.now_ms() >= next_tap_ms {
                if let Some(target) = bot_tap(&session, taps_made) {
                    input.taps.push(TapGesture::quick(target, session.now_ms()));
                    taps_made += 1;
                }
                next_tap_ms += BOT_TAP_INTERVAL_MS;
            }

            tick(&mut session, &input, FRAME_MS);
            summary.peak_objects = summary.peak_objects.max(session.objects().len());
            for event in session.drain_events() {
                summary.record(&event);
            }
        }

        let state = session.state();
        println!("\n=== Emoji Race headless summary ===");
        println!("Simulated:        {:.1}s", session.now_ms() / 1000.0);
        println!("Level:            {} ({})", state.level, session.snapshot().level_name);
        println!("Winner:           {}", state.winner);
        println!("Progress:         {}/{}", state.progress, PROGRESS_MAX);
        println!("Rounds completed: {}", state.targets_destroyed);
        println!("Spawned:          {} ({} targets)", summary.spawned, summary.target_spawns);
        println!("Taps:             {} correct, {} wrong", summary.correct, summary.incorrect);
        println!("Targets missed:   {}", summary.missed_targets);
        println!("Pruned:           {}", summary.pruned);
        println!("Peak on screen:   {}/{}", summary.peak_objects, MAX_ACTIVE_OBJECTS);
        println!("Target changes:   {}", summary.target_changes);
        println!("Worms killed:     {}", summary.worms_killed);
        if summary.errors > 0 {
            println!("Errors:           {}", summary.errors);
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_missing_seed_comes_from_clock() {
            let seeded = with_seed(Settings::default());
            assert!(seeded.seed.is_some_and(|s| s > 0));
        }

        #[test]
        fn test_explicit_seed_is_kept() {
            let settings = Settings {
                seed: Some(7),
                ..Settings::default()
            };
            assert_eq!(with_seed(settings).seed, Some(7));
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Emoji Race (native) starting...");
    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is emoji_race::web::start, this is just to satisfy the compiler
}
