// Copyright 2026 the Layerhack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame-rate sampling.
//!
//! Each session owns an [`FpsMeter`]. Only the newest frame timestamps are
//! kept; once the window is full, recording a frame evicts the oldest one.

use std::collections::VecDeque;

use crate::time::{Duration, HostTime};

/// Rolling frame-rate meter over the most recent frame timestamps.
#[derive(Debug, Clone)]
pub struct FpsMeter {
    samples: VecDeque<HostTime>,
    window: usize,
    last_report: Option<HostTime>,
    report_interval: Duration,
}

impl FpsMeter {
    /// Number of frame timestamps kept by [`Default`].
    pub const DEFAULT_CAPACITY: usize = 64;

    /// How often [`report`](Self::report) yields a value by default.
    pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(1);

    /// Creates a meter with an explicit window size and report interval.
    ///
    /// `capacity` below `2` is promoted to `2`, the minimum needed to measure
    /// an interval.
    #[must_use]
    pub fn new(capacity: usize, report_interval: Duration) -> Self {
        let window = capacity.max(2);
        Self {
            samples: VecDeque::with_capacity(window),
            window,
            last_report: None,
            report_interval,
        }
    }

    /// Records that a frame was submitted at `now`.
    pub fn record(&mut self, now: HostTime) {
        if self.samples.len() == self.window {
            self.samples.pop_front();
        }
        self.samples.push_back(now);
    }

    /// Returns the average frame rate across the sample window.
    ///
    /// `None` until at least two frames with distinct timestamps are recorded.
    #[must_use]
    pub fn fps(&self) -> Option<f64> {
        let (first, last) = (*self.samples.front()?, *self.samples.back()?);
        let span = last.saturating_duration_since(first);
        if span == Duration::ZERO {
            return None;
        }
        let intervals = (self.samples.len() - 1) as f64;
        Some(intervals / span.as_secs_f64())
    }

    /// Returns the current rate once per report interval.
    ///
    /// The first call only arms the interval timer.
    pub fn report(&mut self, now: HostTime) -> Option<f64> {
        let Some(last) = self.last_report else {
            self.last_report = Some(now);
            return None;
        };
        if now.saturating_duration_since(last) < self.report_interval {
            return None;
        }
        self.last_report = Some(now);
        self.fps()
    }

    /// Forgets all samples, e.g. after a resize stalls the pipeline.
    pub fn reset(&mut self) {
        self.samples.clear();
    }
}

impl Default for FpsMeter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY, Self::DEFAULT_REPORT_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::FpsMeter;
    use crate::time::{Duration, HostTime};

    fn frames(meter: &mut FpsMeter, count: u64, interval: Duration) -> HostTime {
        let mut now = HostTime(1_000_000_000);
        for _ in 0..count {
            meter.record(now);
            now = now + interval;
        }
        now
    }

    #[test]
    fn needs_two_samples() {
        let mut meter = FpsMeter::default();
        assert_eq!(meter.fps(), None, "empty meter has no rate");
        meter.record(HostTime(5));
        assert_eq!(meter.fps(), None, "one sample has no interval");
    }

    #[test]
    fn measures_steady_rate() {
        let mut meter = FpsMeter::default();
        frames(&mut meter, 31, Duration::from_micros(33_333));
        let fps = meter.fps().unwrap();
        assert!((fps - 30.0).abs() < 0.01, "expected ~30 fps, got {fps}");
    }

    #[test]
    fn window_tracks_recent_frames() {
        let mut meter = FpsMeter::new(4, Duration::from_secs(1));
        frames(&mut meter, 10, Duration::from_millis(100));
        // Faster frames push the slow ones out of the window.
        let mut now = HostTime(10_000_000_000);
        for _ in 0..4 {
            meter.record(now);
            now = now + Duration::from_millis(10);
        }
        let fps = meter.fps().unwrap();
        assert!((fps - 100.0).abs() < 0.01, "expected ~100 fps, got {fps}");
    }

    #[test]
    fn report_fires_once_per_interval() {
        let mut meter = FpsMeter::default();
        let start = HostTime(0);
        meter.record(start);
        assert_eq!(meter.report(start), None, "first call arms the timer");

        meter.record(HostTime(500_000_000));
        assert_eq!(meter.report(HostTime(500_000_000)), None, "too early");

        meter.record(HostTime(1_000_000_000));
        let fps = meter.report(HostTime(1_000_000_000)).unwrap();
        assert!((fps - 2.0).abs() < 0.01, "expected ~2 fps, got {fps}");
        assert_eq!(meter.report(HostTime(1_100_000_000)), None, "re-armed");
    }

    #[test]
    fn reset_clears_samples() {
        let mut meter = FpsMeter::default();
        frames(&mut meter, 5, Duration::from_millis(16));
        meter.reset();
        assert_eq!(meter.fps(), None, "reset discards the window");
    }
}
