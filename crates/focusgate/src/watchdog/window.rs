//! Sliding-window restart accounting

use std::time::{Duration, Instant};

/// Counts restarts inside a sliding window against a ceiling.
///
/// Entries older than the window fall out on every call, so a burst of
/// crashes long ago never blocks a restart now. A rejected record does not
/// consume a slot.
#[derive(Debug)]
pub struct RestartWindow {
    timestamps: Vec<Instant>,
    span: Duration,
    ceiling: u32,
}

impl RestartWindow {
    pub fn new(span: Duration, ceiling: u32) -> Self {
        Self {
            timestamps: Vec::new(),
            span,
            ceiling,
        }
    }

    /// Record a restart at `now`, unless the window is already full.
    ///
    /// Returns `false` when the ceiling is reached, which callers treat as
    /// a crash loop.
    pub fn try_record(&mut self, now: Instant) -> bool {
        self.timestamps
            .retain(|&at| now.duration_since(at) < self.span);
        if self.timestamps.len() as u32 >= self.ceiling {
            return false;
        }
        self.timestamps.push(now);
        true
    }

    /// Restarts currently inside the window
    #[must_use]
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Width of the sliding window
    #[must_use]
    pub fn span(&self) -> Duration {
        self.span
    }
}
