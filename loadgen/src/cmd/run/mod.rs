use rama::{
    error::{BoxError, ErrorContext as _},
    graceful::ShutdownGuard,
    rt::Executor,
    telemetry::tracing,
};

use clap::Args;
use tokio::time::Instant;

use crate::config::{LoadProfile, ProfileConfig, Scenario, TargetConfig};

pub mod client;
pub mod executor;
pub mod submitter;

mod schedule;
mod vu_pool;

use self::{executor::RunSummary, submitter::BatchSubmitter};

#[derive(Debug, Clone, Args)]
/// generate decision log load against the ingest service
pub struct RunCommand {
    #[arg(long)]
    /// Scenario to run (default: normal),
    /// manually defined parameters overwrite scenario parameters.
    scenario: Option<Scenario>,

    #[clap(flatten)]
    profile: ProfileConfig,

    #[clap(flatten)]
    target: TargetConfig,
}

pub async fn exec(guard: ShutdownGuard, args: RunCommand) -> Result<(), BoxError> {
    let scenario = args.scenario.unwrap_or_default();
    let merged_cfg = merge_profile_cfg(scenario, args.profile);
    let profile = LoadProfile::try_new(scenario.name(), scenario.executor(), merged_cfg)
        .context("resolve load profile")?;

    let endpoint = args.target.logs_endpoint()?;
    let timeout = args.target.request_timeout()?;

    // idle pooled connections must not hold up the graceful shutdown
    let client = self::client::http_client(Executor::default(), timeout)
        .context("create HTTP(S) client")?;
    let submitter = BatchSubmitter::new(client, endpoint);

    tracing::info!(
        endpoint = %submitter.endpoint(),
        timeout = ?timeout,
        expected_iterations = profile.expected_iterations(),
        "start load run: {profile}",
    );

    let start = Instant::now();
    let summary = self::executor::run_constant_arrival_rate(guard, &profile, submitter).await;
    log_summary(&summary, start);

    Ok(())
}

fn log_summary(summary: &RunSummary, start: Instant) {
    let elapsed = start.elapsed();
    tracing::info!(
        started = summary.started,
        accepted = summary.accepted,
        rejected = summary.rejected,
        failed = summary.failed,
        dropped = summary.dropped,
        vus = summary.vus,
        elapsed = ?elapsed,
        "load run finished: {summary}",
    );
}

fn merge_profile_cfg(scenario: Scenario, overwrite_cfg: ProfileConfig) -> ProfileConfig {
    tracing::info!("use scenario to define base config: {}", scenario.name());
    let scenario_cfg = scenario.profile_config();

    macro_rules! merge_config {
        ($scenario:ident, $overwrite:ident, {$($property:ident),+ $(,)?}) => {
            ProfileConfig {
                $(
                    $property: if let Some(value) = $overwrite.$property {
                        tracing::info!("property '{}': use overwrite: {value:?}", stringify!($property));
                        Some(value)
                    } else if let Some(value) = $scenario.$property {
                        tracing::info!("property '{}': use scenario: {value:?}", stringify!($property));
                        Some(value)
                    } else {
                        tracing::info!("property '{}': undefined", stringify!($property));
                        None
                    },
                )+
            }
        };
    }

    merge_config!(
        scenario_cfg, overwrite_cfg,
        {
            rate,
            time_unit,
            duration,
            pre_allocated_vus,
            max_vus,
        }
    )
}
