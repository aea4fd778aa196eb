//! Submission timing heuristic.
//!
//! People need a few seconds to fill a form; a form rendered long ago is
//! stale or replayed.

/// Inclusive window of acceptable form-fill durations, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingWindow {
    pub min_elapsed_ms: i64,
    pub max_elapsed_ms: i64,
}

impl TimingWindow {
    /// 3 seconds to 30 minutes.
    pub const DEFAULT: Self = Self {
        min_elapsed_ms: 3_000,
        max_elapsed_ms: 1_800_000,
    };

    /// Whether a form started at `started_at_ms` and submitted at `now_ms`
    /// falls inside the window. Negative elapsed time is never plausible.
    pub fn is_plausible(&self, started_at_ms: i64, now_ms: i64) -> bool {
        match now_ms.checked_sub(started_at_ms) {
            Some(elapsed) if elapsed >= 0 => {
                (self.min_elapsed_ms..=self.max_elapsed_ms).contains(&elapsed)
            }
            _ => false,
        }
    }
}

impl Default for TimingWindow {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// [`TimingWindow::is_plausible`] with the default window.
pub fn is_timing_plausible(started_at_ms: i64, now_ms: i64) -> bool {
    TimingWindow::DEFAULT.is_plausible(started_at_ms, now_ms)
}
