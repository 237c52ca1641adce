use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

/// Clock abstraction for countdowns and submission timestamps.
///
/// `now()` returns a monotonic reading measured from the clock's origin. Two
/// readings from the same clock can be subtracted to get real elapsed time,
/// independent of how often the caller happened to sample it.
#[derive(Debug, Clone, Copy)]
pub enum Clock {
    /// Real monotonic time, measured from `origin`.
    System { origin: Instant },
    /// Deterministic time that only moves through `advance`.
    Fixed {
        elapsed: Duration,
        wall: DateTime<Utc>,
    },
}

impl Default for Clock {
    fn default() -> Self {
        Self::system()
    }
}

impl Clock {
    /// Returns a clock backed by the system's monotonic timer.
    #[must_use]
    pub fn system() -> Self {
        Self::System {
            origin: Instant::now(),
        }
    }

    /// Returns a clock frozen at `wall` with a zero monotonic reading.
    #[must_use]
    pub fn fixed(wall: DateTime<Utc>) -> Self {
        Self::Fixed {
            elapsed: Duration::ZERO,
            wall,
        }
    }

    /// Monotonic reading since the clock's origin.
    #[must_use]
    pub fn now(&self) -> Duration {
        match self {
            Clock::System { origin } => origin.elapsed(),
            Clock::Fixed { elapsed, .. } => *elapsed,
        }
    }

    /// Wall-clock time, used only for display and persisted timestamps.
    #[must_use]
    pub fn wall_now(&self) -> DateTime<Utc> {
        match self {
            Clock::System { .. } => Utc::now(),
            Clock::Fixed { wall, .. } => *wall,
        }
    }

    /// If this is a fixed clock, advance both readings by `delta`.
    ///
    /// Has no effect on `Clock::System`.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed { elapsed, wall } = self {
            *elapsed = elapsed.saturating_add(delta);
            if let Some(next) = chrono::Duration::from_std(delta)
                .ok()
                .and_then(|step| wall.checked_add_signed(step))
            {
                *wall = next;
            }
        }
    }

    /// Shorthand for `advance(Duration::from_secs(secs))`.
    pub fn advance_secs(&mut self, secs: u64) {
        self.advance(Duration::from_secs(secs));
    }

    #[must_use]
    pub fn is_system(&self) -> bool {
        matches!(self, Clock::System { .. })
    }
}

/// Deterministic timestamp for tests and examples (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` fixed at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}
