#![forbid(unsafe_code)]

//! One-shot step timers, one slot per segment.
//!
//! Each segment's convergence loop is a chain of one-shot timers: a step
//! runs, then the next check is armed one interval later. The scheduler
//! holds at most one pending deadline per segment, so a second loop for the
//! same segment cannot exist. Time is always passed in, which keeps the
//! display deterministic under a virtual clock.

use web_time::Instant;

/// Pending step deadlines indexed by segment position.
#[derive(Debug, Clone, Default)]
pub struct StepScheduler {
    slots: Vec<Option<Instant>>,
}

impl StepScheduler {
    /// A scheduler for `segments` positions, all idle.
    #[must_use]
    pub fn new(segments: usize) -> Self {
        Self {
            slots: vec![None; segments],
        }
    }

    /// Arm the timer for `segment`, replacing any pending deadline.
    pub fn schedule(&mut self, segment: usize, at: Instant) {
        if let Some(slot) = self.slots.get_mut(segment) {
            *slot = Some(at);
        }
    }

    /// Disarm the timer for `segment`. Returns whether one was pending.
    pub fn cancel(&mut self, segment: usize) -> bool {
        self.slots
            .get_mut(segment)
            .and_then(Option::take)
            .is_some()
    }

    /// Disarm every timer. Returns how many were pending.
    pub fn cancel_all(&mut self) -> usize {
        self.slots
            .iter_mut()
            .filter_map(Option::take)
            .count()
    }

    /// Deadline for `segment`, if armed.
    #[must_use]
    pub fn deadline(&self, segment: usize) -> Option<Instant> {
        self.slots.get(segment).copied().flatten()
    }

    /// Earliest pending deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.slots.iter().flatten().min().copied()
    }

    /// Take the earliest timer that is due at `now`. Ties go to the lower
    /// segment index.
    pub fn pop_due(&mut self, now: Instant) -> Option<(usize, Instant)> {
        let (segment, deadline) = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.map(|at| (i, at)))
            .filter(|&(_, at)| at <= now)
            .min_by_key(|&(i, at)| (at, i))?;
        self.slots[segment] = None;
        Some((segment, deadline))
    }

    /// Number of armed timers.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Whether no timer is armed.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}
