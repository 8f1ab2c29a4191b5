// Copyright 2026 the Layerhack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Clock reads and `poll` timeouts.

use layerhack_core::time::{Duration, HostTime};
use rustix::time::{ClockId, Timespec, clock_gettime};

/// Reads `CLOCK_MONOTONIC`.
#[must_use]
pub fn now() -> HostTime {
    host_time(&clock_gettime(ClockId::Monotonic))
}

fn host_time(ts: &Timespec) -> HostTime {
    let Ok(secs) = u64::try_from(ts.tv_sec) else {
        return HostTime::default();
    };
    let subsec = u64::try_from(ts.tv_nsec).map_or(0, |ns| ns.min(999_999_999));
    let total = secs
        .checked_mul(1_000_000_000)
        .and_then(|ns| ns.checked_add(subsec))
        .unwrap_or(u64::MAX);
    HostTime(total)
}

pub(crate) fn duration_to_timespec(wait: Duration) -> Timespec {
    let (secs, nanos) = wait.split_secs();
    Timespec {
        tv_sec: secs.try_into().unwrap_or(i64::MAX),
        tv_nsec: nanos.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::{duration_to_timespec, host_time, now};
    use layerhack_core::time::{Duration, HostTime};
    use rustix::time::Timespec;

    #[test]
    fn clock_does_not_run_backwards() {
        let (a, b) = (now(), now());
        assert!(b >= a, "{b:?} precedes {a:?}");
    }

    #[test]
    fn host_time_from_timespec() {
        let ts = Timespec {
            tv_sec: 3,
            tv_nsec: 5,
        };
        assert_eq!(host_time(&ts), HostTime(3_000_000_005), "3s + 5ns");

        let huge = Timespec {
            tv_sec: i64::MAX,
            tv_nsec: 0,
        };
        assert_eq!(host_time(&huge), HostTime(u64::MAX), "clamped");

        let negative = Timespec {
            tv_sec: -1,
            tv_nsec: 0,
        };
        assert_eq!(host_time(&negative), HostTime(0), "before the epoch");
    }

    #[test]
    fn sleep_quantum_as_poll_timeout() {
        let ts = duration_to_timespec(Duration::from_micros(33_333));
        assert_eq!((ts.tv_sec, ts.tv_nsec), (0, 33_333_000), "1/30 s");
    }
}
