// Copyright 2026 the Layerhack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame pacing between compositor frame callbacks and hack delays.
//!
//! Two things gate a redraw: the compositor's frame-completion event (tracked
//! by the session) and the delay the hack asked for on its previous draw
//! (tracked here). The driver never sleeps longer than [`MAX_QUANTUM`] so it
//! keeps servicing protocol events even when every hack asks for a long delay.

use crate::time::{Duration, HostTime};

/// Longest single wait of the render loop: one frame at 30 fps.
pub const MAX_QUANTUM: Duration = Duration(1_000_000_000 / 30);

/// Returns how long the driver may wait before the next sweep.
///
/// `deadline` is the earliest moment any drawable session becomes due, or
/// `None` if no session is waiting on a delay.
#[must_use]
pub fn sleep_quantum(now: HostTime, deadline: Option<HostTime>) -> Duration {
    match deadline {
        Some(deadline) => deadline.saturating_duration_since(now).min(MAX_QUANTUM),
        None => MAX_QUANTUM,
    }
}

/// Per-session delay tracker.
///
/// A fresh pacer is due immediately; after [`schedule`](Self::schedule) it
/// becomes due once the hack's requested delay has fully elapsed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pacer {
    deadline: Option<HostTime>,
}

impl Pacer {
    /// Records a draw at `now` that asked for `delay_us` microseconds of rest.
    pub fn schedule(&mut self, now: HostTime, delay_us: u64) {
        self.deadline = Some(now.saturating_add(Duration::from_micros(delay_us)));
    }

    /// Returns whether the requested delay has elapsed at `now`.
    #[must_use]
    pub fn is_due(&self, now: HostTime) -> bool {
        self.deadline.is_none_or(|deadline| now >= deadline)
    }

    /// The moment this pacer becomes due, if a delay is pending.
    #[must_use]
    pub fn deadline(&self) -> Option<HostTime> {
        self.deadline
    }
}

#[cfg(test)]
mod tests {
    use super::{MAX_QUANTUM, Pacer, sleep_quantum};
    use crate::time::{Duration, HostTime};

    #[test]
    fn quantum_is_capped_at_thirty_fps() {
        let now = HostTime(1_000);
        assert_eq!(sleep_quantum(now, None), MAX_QUANTUM);
        let far = now + Duration::from_secs(5);
        assert_eq!(sleep_quantum(now, Some(far)), MAX_QUANTUM);
    }

    #[test]
    fn quantum_shrinks_to_remaining_delay() {
        let now = HostTime(1_000);
        let soon = now + Duration::from_millis(5);
        assert_eq!(sleep_quantum(now, Some(soon)), Duration::from_millis(5));
    }

    #[test]
    fn overdue_deadline_yields_zero_wait() {
        let now = HostTime(10_000);
        assert_eq!(sleep_quantum(now, Some(HostTime(2_000))), Duration::ZERO);
    }

    #[test]
    fn pacer_is_due_until_scheduled() {
        let mut pacer = Pacer::default();
        assert!(pacer.is_due(HostTime(0)), "fresh pacer draws immediately");

        pacer.schedule(HostTime(1_000_000), 20_000);
        assert_eq!(pacer.deadline(), Some(HostTime(21_000_000)));
        assert!(!pacer.is_due(HostTime(20_999_999)), "delay not yet elapsed");
        assert!(pacer.is_due(HostTime(21_000_000)), "delay fully elapsed");
    }

    #[test]
    fn zero_delay_is_due_at_once() {
        let mut pacer = Pacer::default();
        pacer.schedule(HostTime(500), 0);
        assert!(pacer.is_due(HostTime(500)), "zero delay means next sweep");
    }
}
