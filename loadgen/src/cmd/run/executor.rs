use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use rama::{
    Service,
    error::BoxError,
    graceful::ShutdownGuard,
    rt::Executor,
    telemetry::tracing,
};

use crate::config::LoadProfile;

use super::{schedule::ArrivalSchedule, submitter::IterationOutcome, vu_pool::VuPool};

/// Outcome counters of a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Iterations that got a VU and were started.
    pub started: u64,
    /// Batches acknowledged with `204`.
    pub accepted: u64,
    /// Batches answered with any other status.
    pub rejected: u64,
    /// Iterations that ended in an error (transport or otherwise).
    pub failed: u64,
    /// Arrivals that found all VUs busy.
    pub dropped: u64,
    /// VUs allocated at the end of the run.
    pub vus: u32,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "started={} accepted={} rejected={} failed={} dropped={} vus={}",
            self.started, self.accepted, self.rejected, self.failed, self.dropped, self.vus,
        )
    }
}

#[derive(Debug, Default)]
struct IterationStats {
    accepted: AtomicU64,
    rejected: AtomicU64,
    failed: AtomicU64,
}

impl IterationStats {
    fn record(&self, result: &Result<IterationOutcome, BoxError>) {
        let counter = match result {
            Ok(IterationOutcome::Accepted) => &self.accepted,
            Ok(IterationOutcome::Rejected { .. }) => &self.rejected,
            Err(err) => {
                tracing::debug!("iteration failed: {err}");
                &self.failed
            }
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Run the constant-arrival-rate executor for the given profile.
///
/// Every due arrival takes a VU from the pool and runs one `iteration`
/// on its own task. Arrivals that find all VUs busy are dropped.
/// Once the schedule is exhausted, or the guard is cancelled,
/// no new iterations are started and the in-flight ones are awaited.
pub async fn run_constant_arrival_rate<S>(
    guard: ShutdownGuard,
    profile: &LoadProfile,
    iteration: S,
) -> RunSummary
where
    S: Service<(), Output = IterationOutcome, Error = BoxError> + Clone,
{
    let exec = Executor::graceful(guard.clone());
    let stats = Arc::new(IterationStats::default());

    let mut schedule = ArrivalSchedule::new(profile);
    let mut vus = VuPool::new(profile.pre_allocated_vus, profile.max_vus);

    let mut started = 0u64;
    let mut dropped = 0u64;

    loop {
        let index = tokio::select! {
            _ = guard.cancelled() => {
                tracing::warn!("stop scheduling iterations early: guard shutdown");
                break;
            }
            maybe_index = schedule.wait_next() => {
                let Some(index) = maybe_index else {
                    tracing::debug!("arrival schedule exhausted");
                    break;
                };
                index
            }
        };

        let Some(vu) = vus.try_acquire() else {
            if dropped == 0 {
                tracing::warn!(
                    index,
                    max_vus = profile.max_vus,
                    "insufficient VUs: dropping iterations, consider raising max VUs"
                );
            }
            dropped += 1;
            continue;
        };
        started += 1;

        let iteration = iteration.clone();
        let stats = stats.clone();
        exec.spawn_task(async move {
            let result = iteration.serve(()).await;
            stats.record(&result);
            drop(vu);
        });
    }

    tracing::debug!(started, "wait for in-flight iterations");
    vus.wait_idle().await;

    RunSummary {
        started,
        accepted: stats.accepted.load(Ordering::Relaxed),
        rejected: stats.rejected.load(Ordering::Relaxed),
        failed: stats.failed.load(Ordering::Relaxed),
        dropped,
        vus: vus.allocated(),
    }
}
