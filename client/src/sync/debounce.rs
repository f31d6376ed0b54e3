//! Trailing debounce for push notifications.
//!
//! DESIGN
//! ======
//! Each push category owns one `DebounceSlot`. Submitting an event replaces
//! whatever is pending in that slot and pushes its deadline out to
//! `now + delay`, so a burst collapses into the last event of the burst.
//! Slots are independent: a storm of `resources_updated` never delays a
//! `disaster_updated`.
//!
//! The debouncer keeps no timers. The driver asks for `next_deadline`, sleeps
//! until then, and calls `take_due`. Tests do the same with a `ManualClock`.

#[cfg(test)]
#[path = "debounce_test.rs"]
mod debounce_test;

use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::clock::Clock;
use crate::net::types::{PushEvent, PushEventKind};

/// Pending trailing invocation for one category.
#[derive(Debug, Default)]
pub struct DebounceSlot {
    pending: Option<(PushEvent, Instant)>,
}

impl DebounceSlot {
    /// Replace the pending event and restart the window.
    pub fn submit(&mut self, event: PushEvent, due: Instant) {
        self.pending = Some((event, due));
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, due)| *due)
    }

    /// Take the pending event if its window has elapsed.
    pub fn take_if_due(&mut self, now: Instant) -> Option<PushEvent> {
        match &self.pending {
            Some((_, due)) if *due <= now => self.pending.take().map(|(event, _)| event),
            _ => None,
        }
    }

    #[must_use]
    pub fn pending(&self) -> Option<&PushEvent> {
        self.pending.as_ref().map(|(event, _)| event)
    }
}

/// Per-category debouncer for push events.
pub struct Debouncer {
    delay: Duration,
    slots: [DebounceSlot; 3],
    clock: Rc<dyn Clock>,
}

impl Debouncer {
    #[must_use]
    pub fn new(delay: Duration, clock: Rc<dyn Clock>) -> Self {
        Self { delay, slots: Default::default(), clock }
    }

    pub fn submit(&mut self, event: PushEvent) {
        let due = self.clock.now() + self.delay;
        self.slot_mut(event.kind()).submit(event, due);
    }

    /// Earliest deadline across all slots.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.slots.iter().filter_map(DebounceSlot::deadline).min()
    }

    /// Drain every slot whose window has elapsed, earliest first.
    pub fn take_due(&mut self) -> Vec<PushEvent> {
        let now = self.clock.now();
        let mut due: Vec<(Instant, PushEvent)> = self
            .slots
            .iter_mut()
            .filter_map(|slot| {
                let deadline = slot.deadline()?;
                slot.take_if_due(now).map(|event| (deadline, event))
            })
            .collect();
        due.sort_by_key(|(deadline, _)| *deadline);
        due.into_iter().map(|(_, event)| event).collect()
    }

    #[must_use]
    pub fn pending(&self, kind: PushEventKind) -> Option<&PushEvent> {
        self.slot(kind).pending()
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.next_deadline().is_none()
    }

    fn slot(&self, kind: PushEventKind) -> &DebounceSlot {
        &self.slots[slot_index(kind)]
    }

    fn slot_mut(&mut self, kind: PushEventKind) -> &mut DebounceSlot {
        &mut self.slots[slot_index(kind)]
    }
}

fn slot_index(kind: PushEventKind) -> usize {
    match kind {
        PushEventKind::DisasterUpdated => 0,
        PushEventKind::SocialMediaUpdated => 1,
        PushEventKind::ResourcesUpdated => 2,
    }
}
