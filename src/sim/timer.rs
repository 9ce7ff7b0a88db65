//! Single-threaded timers
//!
//! The session owns a virtual millisecond clock. Hosts report wall-clock time
//! with `GameSession::advance_to`, and every timer that came due fires in
//! order on the same thread. Nothing here blocks or spawns.

use crate::consts::*;

/// What a pending timer wakes the session up for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// One second of the stage countdown has elapsed
    CountdownTick,
    /// The post-timeout reveal has been shown long enough
    RevealElapsed,
}

/// A pending timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    pub due_ms: u64,
    pub kind: TimerKind,
    /// Owner generation at scheduling time; stale timers are ignored
    pub generation: u64,
}

/// Timer queue ordered by due time, ties firing in scheduling order
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    queue: Vec<Timer>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, timer: Timer) {
        let pos = self.queue.partition_point(|t| t.due_ms <= timer.due_ms);
        self.queue.insert(pos, timer);
    }

    /// Remove and return the earliest timer due at or before `now_ms`
    pub fn pop_due(&mut self, now_ms: u64) -> Option<Timer> {
        match self.queue.first() {
            Some(t) if t.due_ms <= now_ms => Some(self.queue.remove(0)),
            _ => None,
        }
    }

    pub fn next_due(&self) -> Option<u64> {
        self.queue.first().map(|t| t.due_ms)
    }

    /// Drop every pending timer of `kind`
    pub fn cancel(&mut self, kind: TimerKind) {
        self.queue.retain(|t| t.kind != kind);
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Result of delivering a countdown tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownStep {
    /// One second gone, this many left
    Ticked(u32),
    /// Reached zero; the countdown has stopped
    Expired,
    /// Tick from a cancelled or finished countdown
    Stale,
}

/// Per-stage countdown in whole seconds
///
/// Starting a new countdown invalidates every tick the previous one scheduled,
/// so at most one countdown is live per session.
#[derive(Debug, Clone)]
pub struct Countdown {
    limit_secs: u32,
    remaining: u32,
    generation: u64,
    running: bool,
}

impl Countdown {
    pub fn new(limit_secs: u32) -> Self {
        let limit_secs = limit_secs.max(1);
        Self {
            limit_secs,
            remaining: limit_secs,
            generation: 0,
            running: false,
        }
    }

    pub fn limit_secs(&self) -> u32 {
        self.limit_secs
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// (Re)start from the full limit, cancelling any live countdown
    pub fn start(&mut self, now_ms: u64, scheduler: &mut Scheduler) {
        self.cancel(scheduler);
        self.remaining = self.limit_secs;
        self.running = true;
        scheduler.schedule(Timer {
            due_ms: now_ms + TICK_MS,
            kind: TimerKind::CountdownTick,
            generation: self.generation,
        });
    }

    pub fn cancel(&mut self, scheduler: &mut Scheduler) {
        self.running = false;
        self.generation += 1;
        scheduler.cancel(TimerKind::CountdownTick);
    }

    pub fn on_tick(&mut self, timer: &Timer, scheduler: &mut Scheduler) -> CountdownStep {
        if !self.running || timer.generation != self.generation {
            return CountdownStep::Stale;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            return CountdownStep::Expired;
        }

        scheduler.schedule(Timer {
            due_ms: timer.due_ms + TICK_MS,
            kind: TimerKind::CountdownTick,
            generation: self.generation,
        });
        CountdownStep::Ticked(self.remaining)
    }
}
