//! Session timers
//!
//! Timers are plain data owned by the session: a kind, a due time and an
//! optional repeat period. Nothing captures state, so clearing the queue is
//! all it takes to guarantee a torn-down session never fires again.

use serde::{Deserialize, Serialize};

/// What a timer does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerKind {
    /// Guarantee a target in each lane shortly after a level starts
    ImmediateTargets,
    /// Periodic batch spawn
    SpawnObjects,
    /// One worm of the staggered opening wave
    ProgressiveWorm,
    /// Recurring worm wave
    RecurringWorms,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Timer {
    /// Insertion order, breaks ties between equal due times
    seq: u64,
    kind: TimerKind,
    due_ms: f64,
    repeat_ms: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimerQueue {
    timers: Vec<Timer>,
    next_seq: u64,
}

impl TimerQueue {
    fn push(&mut self, kind: TimerKind, due_ms: f64, repeat_ms: Option<f64>) {
        self.next_seq += 1;
        self.timers.push(Timer {
            seq: self.next_seq,
            kind,
            due_ms,
            repeat_ms,
        });
    }

    /// Fire once, `delay_ms` after `now_ms`
    pub fn schedule_once(&mut self, kind: TimerKind, now_ms: f64, delay_ms: f64) {
        self.push(kind, now_ms + delay_ms.max(0.0), None)
    }

    /// Fire every `interval_ms`, first time one interval from now
    pub fn schedule_every(&mut self, kind: TimerKind, now_ms: f64, interval_ms: f64) {
        let interval = interval_ms.max(1.0);
        self.push(kind, now_ms + interval, Some(interval))
    }

    /// Cancel every pending timer
    pub fn clear(&mut self) {
        self.timers.clear();
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Number of pending timers of a kind
    pub fn count(&self, kind: TimerKind) -> usize {
        self.timers.iter().filter(|t| t.kind == kind).count()
    }

    /// Collect every firing due at or before `now_ms`, in due order.
    ///
    /// One-shot timers are removed; repeating timers are re-armed and fire
    /// once per elapsed period.
    pub fn pop_due(&mut self, now_ms: f64) -> Vec<TimerKind> {
        let mut fired: Vec<(f64, u64, TimerKind)> = Vec::new();

        self.timers.retain_mut(|timer| {
            while timer.due_ms <= now_ms {
                fired.push((timer.due_ms, timer.seq, timer.kind));
                match timer.repeat_ms {
                    Some(interval) => timer.due_ms += interval,
                    None => return false,
                }
            }
            true
        });

        fired.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        fired.into_iter().map(|(_, _, kind)| kind).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_shot_fires_once() {
        let mut timers = TimerQueue::default();
        timers.schedule_once(TimerKind::ImmediateTargets, 0.0, 100.0);
        assert!(timers.pop_due(50.0).is_empty());
        assert_eq!(timers.pop_due(100.0), vec![TimerKind::ImmediateTargets]);
        assert!(timers.is_empty());
        assert!(timers.pop_due(1000.0).is_empty());
    }

    #[test]
    fn test_repeating_catches_up() {
        let mut timers = TimerQueue::default();
        timers.schedule_every(TimerKind::SpawnObjects, 0.0, 1500.0);
        assert!(timers.pop_due(1499.0).is_empty());
        assert_eq!(timers.pop_due(4600.0).len(), 3);
        assert_eq!(timers.len(), 1);
    }

    #[test]
    fn test_firings_are_ordered_by_due_time() {
        let mut timers = TimerQueue::default();
        timers.schedule_once(TimerKind::RecurringWorms, 0.0, 300.0);
        timers.schedule_once(TimerKind::ProgressiveWorm, 0.0, 100.0);
        timers.schedule_once(TimerKind::ImmediateTargets, 0.0, 200.0);
        assert_eq!(
            timers.pop_due(500.0),
            vec![
                TimerKind::ProgressiveWorm,
                TimerKind::ImmediateTargets,
                TimerKind::RecurringWorms
            ]
        );
    }

    #[test]
    fn test_equal_due_times_fire_in_schedule_order() {
        let mut timers = TimerQueue::default();
        timers.schedule_once(TimerKind::RecurringWorms, 0.0, 100.0);
        timers.schedule_once(TimerKind::ProgressiveWorm, 0.0, 100.0);
        assert_eq!(
            timers.pop_due(100.0),
            vec![TimerKind::RecurringWorms, TimerKind::ProgressiveWorm]
        );
    }

    #[test]
    fn test_clear() {
        let mut timers = TimerQueue::default();
        timers.schedule_every(TimerKind::SpawnObjects, 0.0, 10.0);
        timers.schedule_once(TimerKind::ProgressiveWorm, 0.0, 10.0);
        assert_eq!(timers.count(TimerKind::ProgressiveWorm), 1);
        timers.clear();
        assert!(timers.is_empty());
        assert!(timers.pop_due(1e9).is_empty());
    }
}
