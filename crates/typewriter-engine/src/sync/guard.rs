use std::time::{Duration, Instant};

/// Suppresses scroll events for a short window after a programmatic scroll,
/// so the echo of our own scroll is not mirrored back.
#[derive(Debug, Clone)]
pub struct ScrollGuard {
    window: Duration,
    suppressed_until: Option<Instant>,
}

impl ScrollGuard {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            suppressed_until: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Starts (or extends) the window from `now`.
    pub fn suppress(&mut self, now: Instant) {
        self.suppressed_until = Some(now + self.window);
    }

    pub fn is_suppressed(&self, now: Instant) -> bool {
        self.suppressed_until.is_some_and(|until| now < until)
    }
}
