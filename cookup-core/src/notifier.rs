//! Cross-surface change notification.
//!
//! Every mounted surface (navigation bar, dashboard, mastery board) observes
//! the ledger through topics. Same-context writes arrive through
//! [`Notifier::notify`]; writes from another context (another tab) arrive
//! through [`Notifier::notify_external`] and are mapped onto the very same
//! topics, so observers never need to know where a change came from.
//! Notifications carry no payload: observers always re-read the ledger.

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::constants::{
    KEY_ACHIEVEMENTS, KEY_COUNTERS, KEY_DAILY_COMPLETED, KEY_DAILY_MISSION, KEY_HISTORY,
    KEY_MASTERY, KEY_PROFILE,
};

/// Logical groups of ledger state that observers can watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Topic {
    ProfileChanged,
    CountersChanged,
    AchievementsChanged,
    MasteryChanged,
    DailyMissionChanged,
}

impl Topic {
    pub const ALL: [Self; 5] = [
        Self::ProfileChanged,
        Self::CountersChanged,
        Self::AchievementsChanged,
        Self::MasteryChanged,
        Self::DailyMissionChanged,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ProfileChanged => "profile-changed",
            Self::CountersChanged => "counters-changed",
            Self::AchievementsChanged => "achievements-changed",
            Self::MasteryChanged => "mastery-progress-changed",
            Self::DailyMissionChanged => "daily-mission-changed",
        }
    }

    /// Map a persisted key onto the topic its observers care about.
    #[must_use]
    pub fn for_key(key: &str) -> Option<Self> {
        match key {
            KEY_PROFILE => Some(Self::ProfileChanged),
            KEY_COUNTERS | KEY_HISTORY => Some(Self::CountersChanged),
            KEY_ACHIEVEMENTS => Some(Self::AchievementsChanged),
            KEY_MASTERY => Some(Self::MasteryChanged),
            KEY_DAILY_MISSION | KEY_DAILY_COMPLETED => Some(Self::DailyMissionChanged),
            _ => None,
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type Handler = Rc<dyn Fn()>;

#[derive(Default)]
struct NotifierInner {
    next_id: Cell<u64>,
    handlers: RefCell<Vec<(u64, Topic, Handler)>>,
    hold_depth: Cell<u32>,
    pending: RefCell<BTreeSet<Topic>>,
}

/// Topic-based notifier shared by every ledger surface in one context.
///
/// Cloning yields another handle onto the same subscriber list.
#[derive(Clone, Default)]
pub struct Notifier {
    inner: Rc<NotifierInner>,
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("subscribers", &self.subscriber_count())
            .field("hold_depth", &self.inner.hold_depth.get())
            .finish()
    }
}

impl Notifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inform every observer of `topic`, or queue it while a batch is held.
    pub fn notify(&self, topic: Topic) {
        if self.inner.hold_depth.get() > 0 {
            self.inner.pending.borrow_mut().insert(topic);
            return;
        }
        self.dispatch(topic);
    }

    /// Notify the topic that owns a persisted key; unrelated keys are ignored.
    pub fn notify_key(&self, key: &str) {
        if let Some(topic) = Topic::for_key(key) {
            self.notify(topic);
        }
    }

    /// Entry point for changes made by another context sharing the storage
    /// medium. `None` means the whole medium was cleared.
    pub fn notify_external(&self, key: Option<&str>) {
        match key {
            Some(key) => self.notify_key(key),
            None => {
                for topic in Topic::ALL {
                    self.notify(topic);
                }
            }
        }
    }

    /// Register `handler` for `topic`. The handler stays registered until the
    /// returned [`Subscription`] is dropped or explicitly unsubscribed.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn on_notify(&self, topic: Topic, handler: impl Fn() + 'static) -> Subscription {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner
            .handlers
            .borrow_mut()
            .push((id, topic, Rc::new(handler)));
        Subscription {
            notifier: Rc::downgrade(&self.inner),
            id,
        }
    }

    /// Defer notifications until the returned batch (and any enclosing batch)
    /// is dropped. Topics raised while held are delivered once each.
    #[must_use = "notifications flush when the batch is dropped"]
    pub fn hold(&self) -> NotifyBatch {
        self.inner.hold_depth.set(self.inner.hold_depth.get() + 1);
        NotifyBatch {
            notifier: self.clone(),
        }
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.handlers.borrow().len()
    }

    fn dispatch(&self, topic: Topic) {
        // Handlers may subscribe, unsubscribe or notify again.
        let matching: Vec<(u64, Handler)> = self
            .inner
            .handlers
            .borrow()
            .iter()
            .filter(|(_, t, _)| *t == topic)
            .map(|(id, _, h)| (*id, Rc::clone(h)))
            .collect();
        log::trace!("notify {topic} -> {} observer(s)", matching.len());
        for (id, handler) in matching {
            // Skip handlers detached by an earlier handler in this round.
            if self.is_registered(id) {
                handler();
            }
        }
    }

    fn is_registered(&self, id: u64) -> bool {
        self.inner
            .handlers
            .borrow()
            .iter()
            .any(|(registered, _, _)| *registered == id)
    }

    fn release(&self) {
        let depth = self.inner.hold_depth.get().saturating_sub(1);
        self.inner.hold_depth.set(depth);
        if depth > 0 {
            return;
        }
        let pending = std::mem::take(&mut *self.inner.pending.borrow_mut());
        for topic in pending {
            self.notify(topic);
        }
    }
}

/// Registration handle returned by [`Notifier::on_notify`].
#[derive(Debug)]
pub struct Subscription {
    notifier: Weak<NotifierInner>,
    id: u64,
}

impl Subscription {
    /// Detach the handler now. Equivalent to dropping the subscription.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.notifier.upgrade() {
            inner.handlers.borrow_mut().retain(|(id, _, _)| *id != self.id);
        }
    }
}

/// Guard returned by [`Notifier::hold`].
pub struct NotifyBatch {
    notifier: Notifier,
}

impl Drop for NotifyBatch {
    fn drop(&mut self) {
        self.notifier.release();
    }
}
