//! Per-view call throttles.
//!
//! DESIGN
//! ======
//! One `RateGate` per fetchable view. A gate admits a call when nothing has
//! been recorded yet or the last admitted call is at least `min_interval`
//! old. Callers mark the gate as soon as they decide to proceed, before the
//! response arrives, so triggers landing while a fetch is in flight are
//! dropped too.
//!
//! TRADE-OFFS
//! ==========
//! This suppresses UI noise; it is not a correctness guarantee. Denied calls
//! are not queued. The next natural trigger retries.

#[cfg(test)]
#[path = "throttle_test.rs"]
mod throttle_test;

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::clock::Clock;
use crate::render::Panel;

// =============================================================================
// CATEGORY
// =============================================================================

/// A server view that can be re-fetched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Disasters,
    SocialMedia,
    Resources,
    Updates,
}

impl Category {
    pub const ALL: [Self; 4] = [Self::Disasters, Self::SocialMedia, Self::Resources, Self::Updates];

    /// Whether the fetch is keyed by the selected disaster.
    #[must_use]
    pub fn requires_selection(self) -> bool {
        !matches!(self, Self::Disasters)
    }

    #[must_use]
    pub fn panel(self) -> Panel {
        match self {
            Self::Disasters => Panel::Disasters,
            Self::SocialMedia => Panel::SocialMedia,
            Self::Resources => Panel::Resources,
            Self::Updates => Panel::Updates,
        }
    }

    /// Short lowercase name used in logs and console commands.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Disasters => "disasters",
            Self::SocialMedia => "social",
            Self::Resources => "resources",
            Self::Updates => "updates",
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Disasters => 0,
            Self::SocialMedia => 1,
            Self::Resources => 2,
            Self::Updates => 3,
        }
    }
}

// =============================================================================
// RATE GATE
// =============================================================================

/// Minimum-interval gate for one category.
#[derive(Debug)]
pub struct RateGate {
    last_call: Cell<Option<Instant>>,
    min_interval: Duration,
}

impl RateGate {
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self { last_call: Cell::new(None), min_interval }
    }

    #[must_use]
    pub fn allow(&self, now: Instant) -> bool {
        self.last_call
            .get()
            .is_none_or(|last| now.saturating_duration_since(last) >= self.min_interval)
    }

    pub fn mark_called(&self, now: Instant) {
        self.last_call.set(Some(now));
    }

    #[must_use]
    pub fn last_call(&self) -> Option<Instant> {
        self.last_call.get()
    }

    /// Forget the call marked at `marked`. A newer mark is left alone.
    pub fn release(&self, marked: Instant) {
        if self.last_call.get() == Some(marked) {
            self.last_call.set(None);
        }
    }
}

// =============================================================================
// RATE LIMITER
// =============================================================================

/// The set of gates, one per [`Category`], sharing a clock.
pub struct RateLimiter {
    gates: [RateGate; 4],
    clock: Rc<dyn Clock>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(min_interval: Duration, clock: Rc<dyn Clock>) -> Self {
        Self { gates: std::array::from_fn(|_| RateGate::new(min_interval)), clock }
    }

    #[must_use]
    pub fn allow(&self, category: Category) -> bool {
        self.gate(category).allow(self.clock.now())
    }

    pub fn mark_called(&self, category: Category) {
        self.gate(category).mark_called(self.clock.now());
    }

    /// `allow` then `mark_called` in one step. Returns whether the call may
    /// proceed.
    pub fn try_acquire(&self, category: Category) -> bool {
        self.acquire(category).is_some()
    }

    /// Like [`RateLimiter::try_acquire`], returning the mark so the caller
    /// can hand the slot back with [`RateLimiter::release`].
    pub fn acquire(&self, category: Category) -> Option<Instant> {
        let now = self.clock.now();
        let gate = self.gate(category);
        if !gate.allow(now) {
            return None;
        }
        gate.mark_called(now);
        Some(now)
    }

    /// Reopen a gate whose call produced nothing worth showing.
    pub fn release(&self, category: Category, marked: Instant) {
        self.gate(category).release(marked);
    }

    #[must_use]
    pub fn gate(&self, category: Category) -> &RateGate {
        &self.gates[category.index()]
    }
}
