use std::time::Duration;

use tokio::time::{Instant, sleep_until};

use crate::config::LoadProfile;

/// Fixed-rate arrival schedule.
///
/// Arrival `i` is due at `start + i * time_unit / rate`. Offsets are computed
/// from the start for every arrival in integer nanoseconds, so rounding errors
/// never accumulate. A wake-up that comes in late does not skip arrivals:
/// the ones that are overdue are handed out back to back.
///
/// The schedule ends with the first arrival due at or after `start + duration`.
pub(super) struct ArrivalSchedule {
    start: Instant,
    rate: u128,
    time_unit_nanos: u128,
    duration_nanos: u128,
    next: u64,
}

impl ArrivalSchedule {
    pub(super) fn new(profile: &LoadProfile) -> Self {
        Self::new_at(Instant::now(), profile)
    }

    fn new_at(start: Instant, profile: &LoadProfile) -> Self {
        Self {
            start,
            rate: u128::from(profile.rate.max(1)),
            time_unit_nanos: profile.time_unit.as_nanos(),
            duration_nanos: profile.duration.as_nanos(),
            next: 0,
        }
    }

    /// Offset from the start at which arrival `index` is due,
    /// `None` once that offset falls outside of the run duration.
    fn offset(&self, index: u64) -> Option<Duration> {
        let nanos = u128::from(index) * self.time_unit_nanos / self.rate;
        if nanos >= self.duration_nanos {
            return None;
        }
        let secs = u64::try_from(nanos / 1_000_000_000).ok()?;
        // < 1e9, fits
        let subsec = (nanos % 1_000_000_000) as u32;
        Some(Duration::new(secs, subsec))
    }

    /// Wait until the next arrival is due and return its index.
    ///
    /// Cancel safe: dropping the future before it completes
    /// leaves the arrival pending.
    pub(super) async fn wait_next(&mut self) -> Option<u64> {
        let offset = self.offset(self.next)?;
        sleep_until(self.start + offset).await;

        let index = self.next;
        self.next += 1;
        Some(index)
    }
}
