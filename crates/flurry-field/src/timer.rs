//! Repeating frame timer with a single cancel handle.

use std::time::{Duration, Instant};

/// ~60 frames per second.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_micros(16_600);

/// Repeating frame timer.
///
/// The next frame is scheduled only from inside [`FrameTimer::poll`], so two
/// frames can never overlap, and [`FrameTimer::cancel`] is the only way to
/// stop it.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    interval: Duration,
    /// When the next frame is due, `None` while cancelled.
    next_due: Option<Instant>,
    /// When the previous frame ran (or when the timer was armed).
    last_frame: Option<Instant>,
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_INTERVAL)
    }
}

impl FrameTimer {
    /// Create a cancelled timer with the given interval.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            next_due: None,
            last_frame: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval.max(Duration::from_millis(1));
    }

    /// Arm the timer. Returns false if it was already armed.
    pub fn arm(&mut self, now: Instant) -> bool {
        if self.next_due.is_some() {
            return false;
        }
        self.next_due = Some(now + self.interval);
        self.last_frame = Some(now);
        true
    }

    /// Cancel the pending frame.
    pub fn cancel(&mut self) {
        self.next_due = None;
        self.last_frame = None;
    }

    pub fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    /// Run the frame if it is due.
    ///
    /// Returns the time since the previous frame and schedules the next one.
    /// A host that fell far behind gets one frame, not a burst of catch-up
    /// frames.
    pub fn poll(&mut self, now: Instant) -> Option<Duration> {
        let due = self.next_due?;
        if now < due {
            return None;
        }

        let delta = self
            .last_frame
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or(self.interval);
        self.last_frame = Some(now);
        self.next_due = Some(now + self.interval);
        Some(delta)
    }

    /// How long until the next frame, `None` while cancelled.
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.next_due.map(|due| due.saturating_duration_since(now))
    }
}
