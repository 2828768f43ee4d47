//! Explicit listener subscriptions for single-threaded event sources.

use std::cell::RefCell;
use std::rc::Weak;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of a subscribing component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Allocate an id no other component holds.
    pub fn unique() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Listener registry with at most one entry per component.
///
/// Listeners are held weakly: an event source never keeps a component alive,
/// and dropped components are pruned on the next dispatch.
pub struct Subscribers<L: ?Sized> {
    entries: Vec<(SubscriberId, Weak<RefCell<L>>)>,
}

impl<L: ?Sized> Default for Subscribers<L> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<L: ?Sized> std::fmt::Debug for Subscribers<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("owners", &self.entries.iter().map(|(id, _)| id).collect::<Vec<_>>())
            .finish()
    }
}

impl<L: ?Sized> Subscribers<L> {
    /// Register `listener` for `owner`.
    ///
    /// Returns true if an earlier subscription of the same owner was replaced.
    pub fn subscribe(&mut self, owner: SubscriberId, listener: Weak<RefCell<L>>) -> bool {
        if let Some(entry) = self.entries.iter_mut().find(|(id, _)| *id == owner) {
            entry.1 = listener;
            return true;
        }
        self.entries.push((owner, listener));
        false
    }

    /// Remove the subscription of `owner`. Returns false if there was none.
    pub fn unsubscribe(&mut self, owner: SubscriberId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(id, _)| *id != owner);
        self.entries.len() != before
    }

    pub fn contains(&self, owner: SubscriberId) -> bool {
        self.entries.iter().any(|(id, _)| *id == owner)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Call `f` on every live listener, returning how many were notified.
    ///
    /// A listener that is already borrowed (the event was raised from inside
    /// one of its own methods) is skipped instead of panicking.
    pub fn notify(&mut self, mut f: impl FnMut(&mut L)) -> usize {
        self.entries.retain(|(id, weak)| {
            let alive = weak.strong_count() > 0;
            if !alive {
                log::debug!("Pruning dropped subscriber {id:?}");
            }
            alive
        });

        let mut notified = 0;
        for (id, weak) in &self.entries {
            let Some(listener) = weak.upgrade() else {
                continue;
            };
            match listener.try_borrow_mut() {
                Ok(mut listener) => {
                    f(&mut *listener);
                    notified += 1;
                }
                Err(_) => log::warn!("Subscriber {id:?} is busy, skipping re-entrant notification"),
            }
        }
        notified
    }
}
