use std::time::Duration;

use rama::graceful::Shutdown;

use crate::{
    cmd::run::{
        executor::{RunSummary, run_constant_arrival_rate},
        submitter::BatchSubmitter,
    },
    config::{ExecutorKind, LoadProfile, ProfileConfig},
    test::e2e,
};

fn profile(rate: u32, duration: Duration) -> LoadProfile {
    LoadProfile::try_new(
        "e2e",
        ExecutorKind::ConstantArrivalRate,
        ProfileConfig {
            rate: Some(rate),
            time_unit: Some(Duration::from_secs(1)),
            duration: Some(duration),
            pre_allocated_vus: Some(2),
            max_vus: Some(8),
        },
    )
    .unwrap()
}

#[tokio::test]
#[tracing_test::traced_test]
async fn test_constant_arrival_rate_against_sink() {
    let runtime = e2e::runtime::spawn_with_args(&[]).await;
    let submitter = BatchSubmitter::new(runtime.client(), runtime.logs_endpoint());

    let shutdown = Shutdown::new(std::future::pending::<()>());
    let summary =
        run_constant_arrival_rate(shutdown.guard(), &profile(20, Duration::from_secs(1)), submitter)
            .await;

    assert_eq!(summary.started + summary.dropped, 20);
    assert_eq!(summary.accepted, summary.started);
    assert_eq!(summary.rejected, 0);
    assert_eq!(summary.failed, 0);

    let stats = runtime.stats().await;
    assert_eq!(stats.batches, summary.accepted);
}

#[tokio::test]
#[tracing_test::traced_test]
async fn test_run_counts_rejections_from_failing_sink() {
    let runtime = e2e::runtime::spawn_with_args(&["--error-rate", "1.0"]).await;
    let submitter = BatchSubmitter::new(runtime.client(), runtime.logs_endpoint());

    let shutdown = Shutdown::new(std::future::pending::<()>());
    let summary =
        run_constant_arrival_rate(shutdown.guard(), &profile(5, Duration::from_secs(1)), submitter)
            .await;

    assert_eq!(
        summary,
        RunSummary {
            started: 5,
            accepted: 0,
            rejected: 5,
            failed: 0,
            dropped: 0,
            vus: summary.vus,
        }
    );
    assert!(logs_contain("500"));
}

#[tokio::test]
async fn test_run_command_against_sink() {
    let runtime = e2e::runtime::spawn_with_args(&[]).await;
    let base_url = runtime.base_url().to_string();

    let args = <crate::Args as clap::Parser>::try_parse_from([
        crate::utils::env::project_name(),
        "run",
        "--scenario",
        "smoke",
        "--duration",
        "2s",
        "--base-url",
        base_url.as_str(),
        "--timeout",
        "10s",
        "--graceful",
        "5",
    ])
    .unwrap();

    crate::run_with_args(std::future::pending::<()>(), args)
        .await
        .unwrap();

    let stats = runtime.stats().await;
    assert_eq!(stats.batches, 2);
    assert_eq!(stats.rejected, 0);
}
