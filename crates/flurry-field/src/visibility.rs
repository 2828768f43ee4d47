//! Pause/resume animations when the display surface is hidden.

use std::cell::RefCell;
use std::rc::Weak;

use crate::subscription::{SubscriberId, Subscribers};

/// Whether the display surface can currently be seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

/// An animation that can be paused while nobody is looking.
pub trait VisibilityListener {
    fn on_hidden(&mut self);
    fn on_visible(&mut self);
}

/// Edge-triggered visibility relay.
#[derive(Debug, Default)]
pub struct VisibilityGate {
    state: Visibility,
    subscribers: Subscribers<dyn VisibilityListener>,
}

impl VisibilityGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Visibility {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        self.state == Visibility::Visible
    }

    pub fn subscribe(
        &mut self,
        owner: SubscriberId,
        listener: Weak<RefCell<dyn VisibilityListener>>,
    ) {
        if self.subscribers.subscribe(owner, listener) {
            log::debug!("Replaced visibility subscription of {owner:?}");
        }
    }

    pub fn unsubscribe(&mut self, owner: SubscriberId) {
        self.subscribers.unsubscribe(owner);
    }

    /// Feed a visibility signal from the host.
    ///
    /// Subscribers are only told about transitions; repeating the current
    /// state does nothing. Returns true if the state changed.
    pub fn signal(&mut self, visible: bool) -> bool {
        let next = if visible {
            Visibility::Visible
        } else {
            Visibility::Hidden
        };
        if next == self.state {
            return false;
        }
        self.state = next;

        let notified = match next {
            Visibility::Visible => self.subscribers.notify(|l| l.on_visible()),
            Visibility::Hidden => self.subscribers.notify(|l| l.on_hidden()),
        };
        log::debug!("Surface became {next:?}, notified {notified} subscriber(s)");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[derive(Default)]
    struct Transitions {
        hidden: usize,
        visible: usize,
    }

    impl VisibilityListener for Transitions {
        fn on_hidden(&mut self) {
            self.hidden += 1;
        }
        fn on_visible(&mut self) {
            self.visible += 1;
        }
    }

    #[test]
    fn test_only_edges_notify() {
        let seen = Rc::new(RefCell::new(Transitions::default()));
        let mut gate = VisibilityGate::new();
        let weak = Rc::downgrade(&seen);
        let weak: Weak<RefCell<dyn VisibilityListener>> = weak;
        gate.subscribe(SubscriberId::unique(), weak);

        assert!(!gate.signal(true));
        assert!(gate.signal(false));
        assert!(!gate.signal(false));
        assert!(!gate.signal(false));
        assert_eq!(gate.state(), Visibility::Hidden);
        assert!(gate.signal(true));
        assert!(!gate.signal(true));

        let seen = seen.borrow();
        assert_eq!(seen.hidden, 1);
        assert_eq!(seen.visible, 1);
        assert!(gate.is_visible());
    }
}
