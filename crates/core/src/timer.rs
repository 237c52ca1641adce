//! Monotonic countdown.
//!
//! The timer never counts its own ticks. Each `tick` recomputes the remaining
//! time from the clock reading it is handed, so a late, skipped or doubled
//! callback from the scheduler cannot push the countdown out of line with
//! real elapsed time.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running,
    Expired,
    Cancelled,
}

/// What a single tick observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTick {
    /// The timer is idle, cancelled or already expired; nothing happened.
    Inactive,
    Running { remaining: u64 },
    /// Emitted once, on the tick that reached zero.
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownTimer {
    total: u64,
    remaining: u64,
    started_at: Duration,
    stopped_at: Option<Duration>,
    state: TimerState,
}

impl Default for CountdownTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl CountdownTimer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            total: 0,
            remaining: 0,
            started_at: Duration::ZERO,
            stopped_at: None,
            state: TimerState::Idle,
        }
    }

    /// Begin counting down `total_seconds` from the clock reading `now`.
    pub fn start(&mut self, total_seconds: u64, now: Duration) {
        self.total = total_seconds;
        self.remaining = total_seconds;
        self.started_at = now;
        self.stopped_at = None;
        self.state = TimerState::Running;
    }

    /// Reconcile against the clock reading `now`.
    ///
    /// Remaining time only ever goes down, even if `now` is earlier than a
    /// previous reading.
    pub fn tick(&mut self, now: Duration) -> TimerTick {
        if self.state != TimerState::Running {
            return TimerTick::Inactive;
        }

        self.settle(now);

        if self.remaining == 0 {
            self.state = TimerState::Expired;
            self.stopped_at = Some(now);
            return TimerTick::Expired;
        }
        TimerTick::Running {
            remaining: self.remaining,
        }
    }

    /// Stop without expiring. Returns `false` if the timer was not running.
    ///
    /// `remaining` is settled against `now` so it agrees with
    /// `elapsed_secs` after the stop.
    pub fn cancel(&mut self, now: Duration) -> bool {
        if self.state != TimerState::Running {
            return false;
        }
        self.settle(now);
        self.state = TimerState::Cancelled;
        self.stopped_at = Some(now);
        true
    }

    fn settle(&mut self, now: Duration) {
        let elapsed = now.saturating_sub(self.started_at).as_secs();
        self.remaining = self.remaining.min(self.total.saturating_sub(elapsed));
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Remaining seconds as of the last tick or cancel.
    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    #[must_use]
    pub fn state(&self) -> TimerState {
        self.state
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    /// Whole seconds spent between start and stop (or `now`, while running),
    /// capped at the budget.
    #[must_use]
    pub fn elapsed_secs(&self, now: Duration) -> u64 {
        if self.state == TimerState::Idle {
            return 0;
        }
        let end = self.stopped_at.unwrap_or(now);
        end.saturating_sub(self.started_at)
            .as_secs()
            .min(self.total)
    }
}
