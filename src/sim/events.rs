//! Lifecycle events for telemetry and audio
//!
//! The simulation reports what happened as `GameEvent`s. Sinks are
//! fire-and-forget: `record` cannot fail, so a broken telemetry backend has
//! no way to reach back into the simulation.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::state::Lane;

/// Something worth telling the outside world about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    GameStarted { level: usize },
    GameReset,
    TargetChanged { identity: String, glyph: String },
    ObjectSpawned { id: u32, identity: String, lane: Lane, is_target: bool },
    ObjectTapped { id: u32, identity: String, correct: bool },
    ObjectMissed { id: u32, identity: String, was_target: bool },
    /// Removed to make room for new spawns
    ObjectPruned { id: u32 },
    WormSpawned { id: u32, lane: Lane },
    WormKilled { id: u32 },
    /// Continuous mode: progress hit 100 and was reset
    RoundCompleted { targets_destroyed: u32 },
    LevelAdvanced { level: usize },
    Won,
    Error { message: String },
}

/// Semantic sound cue; the audio layer decides what, if anything, to play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioCue {
    Correct,
    Incorrect,
    Win,
    LevelUp,
    WormSplat,
}

impl GameEvent {
    pub fn audio_cue(&self) -> Option<AudioCue> {
        match self {
            GameEvent::ObjectTapped { correct: true, .. } => Some(AudioCue::Correct),
            GameEvent::ObjectTapped { correct: false, .. } => Some(AudioCue::Incorrect),
            GameEvent::Won => Some(AudioCue::Win),
            GameEvent::LevelAdvanced { .. } => Some(AudioCue::LevelUp),
            GameEvent::WormKilled { .. } => Some(AudioCue::WormSplat),
            _ => None,
        }
    }
}

/// Receives every event the session emits
pub trait EventSink {
    fn record(&mut self, event: &GameEvent);
}

/// Shared sink the host can keep a handle to. A sink that is already
/// borrowed misses the event instead of panicking.
impl<T: EventSink> EventSink for Rc<RefCell<T>> {
    fn record(&mut self, event: &GameEvent) {
        if let Ok(mut sink) = self.try_borrow_mut() {
            sink.record(event);
        }
    }
}

/// Forwards events to the `log` facade
#[derive(Debug, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn record(&mut self, event: &GameEvent) {
        match event {
            GameEvent::Error { message } => log::error!("Simulation error: {}", message),
            GameEvent::ObjectSpawned { .. } | GameEvent::ObjectPruned { .. } => {
                log::trace!("{:?}", event)
            }
            GameEvent::GameStarted { .. }
            | GameEvent::GameReset
            | GameEvent::LevelAdvanced { .. }
            | GameEvent::Won => log::info!("{:?}", event),
            _ => log::debug!("{:?}", event),
        }
    }
}

/// Keeps only the audio cues, for hosts that drive a sound player
#[derive(Debug, Default)]
pub struct AudioCueQueue {
    cues: Vec<AudioCue>,
}

impl AudioCueQueue {
    pub fn drain(&mut self) -> Vec<AudioCue> {
        std::mem::take(&mut self.cues)
    }
}

impl EventSink for AudioCueQueue {
    fn record(&mut self, event: &GameEvent) {
        if let Some(cue) = event.audio_cue() {
            self.cues.push(cue);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_cues() {
        let tapped = |correct| GameEvent::ObjectTapped {
            id: 1,
            identity: "apple".into(),
            correct,
        };
        assert_eq!(tapped(true).audio_cue(), Some(AudioCue::Correct));
        assert_eq!(tapped(false).audio_cue(), Some(AudioCue::Incorrect));
        assert_eq!(GameEvent::Won.audio_cue(), Some(AudioCue::Win));
        assert_eq!(GameEvent::GameReset.audio_cue(), None);
    }

    #[test]
    fn test_audio_queue_filters() {
        let mut queue = AudioCueQueue::default();
        queue.record(&GameEvent::GameStarted { level: 0 });
        queue.record(&GameEvent::WormKilled { id: 3 });
        queue.record(&GameEvent::Won);
        assert_eq!(queue.drain(), vec![AudioCue::WormSplat, AudioCue::Win]);
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_shared_sink_skips_when_borrowed() {
        let queue = Rc::new(RefCell::new(AudioCueQueue::default()));
        let mut sink = queue.clone();
        sink.record(&GameEvent::Won);
        {
            let _held = queue.borrow();
            sink.record(&GameEvent::Won);
        }
        assert_eq!(queue.borrow_mut().drain(), vec![AudioCue::Win]);
    }
}
