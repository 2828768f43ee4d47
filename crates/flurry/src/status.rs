//! Session widgets shown in the status line.

use chrono::{DateTime, Local, TimeDelta};

/// Time on page and keypress tally for the current session.
#[derive(Debug, Clone)]
pub struct SessionStats {
    started_at: DateTime<Local>,
    keypresses: u64,
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStats {
    /// Start a session now.
    pub fn new() -> Self {
        Self::starting_at(Local::now())
    }

    pub fn starting_at(started_at: DateTime<Local>) -> Self {
        Self {
            started_at,
            keypresses: 0,
        }
    }

    /// Count one keypress.
    pub fn record_key(&mut self) {
        self.keypresses = self.keypresses.saturating_add(1);
    }

    pub fn keypresses(&self) -> u64 {
        self.keypresses
    }

    /// Elapsed session time at `now`, formatted as `HH:MM:SS`.
    pub fn time_on_page(&self, now: DateTime<Local>) -> String {
        format_elapsed(now - self.started_at)
    }

    /// Session start as wall-clock time.
    pub fn since(&self) -> String {
        self.started_at.format("%H:%M").to_string()
    }
}

/// Format a duration as `HH:MM:SS`; negative durations count as zero.
fn format_elapsed(elapsed: TimeDelta) -> String {
    let total = elapsed.num_seconds().max(0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
