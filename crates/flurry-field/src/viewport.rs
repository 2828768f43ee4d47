//! Viewport size tracking with resize coalescing.

use std::cell::RefCell;
use std::rc::Weak;
use std::time::{Duration, Instant};

use flurry_core::Bounds;

use crate::subscription::{SubscriberId, Subscribers};

/// Default quiet period before a burst of resize reports is delivered.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(250);

/// Something that wants to hear about settled viewport sizes.
pub trait ResizeListener {
    fn on_resize(&mut self, bounds: Bounds);
}

/// Reports the current viewport size and notifies subscribers on change.
///
/// Raw reports are coalesced: each one restarts the quiet period, and
/// subscribers only hear about the last size once reports stop arriving.
#[derive(Debug)]
pub struct ViewportMonitor {
    current: Option<Bounds>,
    /// Latest unsettled size and when it was reported.
    pending: Option<(Bounds, Instant)>,
    quiet_period: Duration,
    subscribers: Subscribers<dyn ResizeListener>,
}

impl Default for ViewportMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}

impl ViewportMonitor {
    /// Create a monitor with no known size yet.
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            current: None,
            pending: None,
            quiet_period,
            subscribers: Subscribers::default(),
        }
    }

    /// Create a monitor with a known initial size.
    pub fn with_bounds(bounds: Bounds, quiet_period: Duration) -> Self {
        let mut monitor = Self::new(quiet_period);
        monitor.current = usable(bounds);
        monitor
    }

    /// Current settled size, `None` when the host has not provided one.
    pub fn bounds(&self) -> Option<Bounds> {
        self.current
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    pub fn subscribe(&mut self, owner: SubscriberId, listener: Weak<RefCell<dyn ResizeListener>>) {
        if self.subscribers.subscribe(owner, listener) {
            log::debug!("Replaced resize subscription of {owner:?}");
        }
    }

    pub fn unsubscribe(&mut self, owner: SubscriberId) {
        self.subscribers.unsubscribe(owner);
    }

    /// Record a raw resize report from the host.
    pub fn report(&mut self, bounds: Bounds, now: Instant) {
        self.pending = Some((bounds, now));
    }

    /// When the pending report settles, if there is one.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|(_, at)| at + self.quiet_period)
    }

    /// Deliver the pending size if its quiet period has elapsed.
    ///
    /// Returns the size that was delivered. Nothing is delivered when the
    /// settled size equals the current one.
    pub fn poll(&mut self, now: Instant) -> Option<Bounds> {
        let (bounds, reported_at) = self.pending?;
        if now < reported_at + self.quiet_period {
            return None;
        }
        self.pending = None;

        if !bounds.is_usable() {
            log::warn!(
                "Viewport reported unusable size {}x{}, ignoring",
                bounds.width,
                bounds.height
            );
            self.current = None;
            return None;
        }
        if self.current == Some(bounds) {
            return None;
        }

        self.current = Some(bounds);
        let notified = self.subscribers.notify(|l| l.on_resize(bounds));
        log::debug!(
            "Viewport settled at {}x{}, notified {notified} subscriber(s)",
            bounds.width,
            bounds.height
        );
        Some(bounds)
    }
}

fn usable(bounds: Bounds) -> Option<Bounds> {
    bounds.is_usable().then_some(bounds)
}
