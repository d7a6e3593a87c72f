use std::sync::Arc;

use rama::telemetry::tracing;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Bounded pool of virtual users.
///
/// Idle VUs are the available permits of a semaphore.
/// The pool starts with the pre-allocated VUs and grows one VU at a time,
/// whenever an arrival finds none idle, until `max` VUs exist.
pub(super) struct VuPool {
    idle: Arc<Semaphore>,
    allocated: u32,
    max: u32,
}

/// A busy virtual user, it returns to the pool when dropped.
#[derive(Debug)]
pub(super) struct Vu {
    _permit: OwnedSemaphorePermit,
}

impl VuPool {
    pub(super) fn new(pre_allocated: u32, max: u32) -> Self {
        let max = max.max(1);
        let allocated = pre_allocated.min(max);
        Self {
            idle: Arc::new(Semaphore::new(allocated as usize)),
            allocated,
            max,
        }
    }

    /// Amount of VUs that exist right now, idle or busy.
    pub(super) fn allocated(&self) -> u32 {
        self.allocated
    }

    /// Take an idle VU, allocating a new one if needed and allowed.
    ///
    /// `None` means all `max` VUs are busy.
    pub(super) fn try_acquire(&mut self) -> Option<Vu> {
        if let Ok(permit) = self.idle.clone().try_acquire_owned() {
            return Some(Vu { _permit: permit });
        }

        if self.allocated >= self.max {
            return None;
        }

        self.allocated += 1;
        tracing::debug!(
            allocated = self.allocated,
            max = self.max,
            "no idle VU available: allocate one more"
        );

        // the new VU goes straight to the caller,
        // only the owner of the pool acquires so it cannot be stolen
        self.idle.add_permits(1);
        self.idle
            .clone()
            .try_acquire_owned()
            .ok()
            .map(|permit| Vu { _permit: permit })
    }

    /// Wait until every allocated VU is idle again.
    pub(super) async fn wait_idle(&self) {
        match self.idle.acquire_many(self.allocated).await {
            Ok(all) => drop(all),
            Err(err) => tracing::debug!("VU pool closed while waiting for idle VUs: {err}"),
        }
    }
}
