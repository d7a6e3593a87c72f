use rama::{
    error::BoxError,
    http::{BodyExtractExt as _, StatusCode, service::client::HttpClientExt as _},
};
use rand::{SeedableRng as _, rngs::StdRng};

use crate::{
    cmd::run::submitter::{BatchSubmitter, IterationOutcome},
    decision_log::DecisionLogBatch,
    test::e2e,
};

#[tokio::test]
#[tracing_test::traced_test]
async fn test_batches_are_accepted_by_sink() {
    let runtime = e2e::runtime::spawn_with_args(&[]).await;
    let submitter = BatchSubmitter::new(runtime.client(), runtime.logs_endpoint());

    let mut records = 0;
    for size in 1..=5 {
        let batch = DecisionLogBatch::generate(size, &mut StdRng::seed_from_u64(size as u64));
        records += size as u64;

        let outcome = submitter.submit(&batch).await.unwrap();
        assert_eq!(outcome, IterationOutcome::Accepted);
    }

    for _ in 0..10 {
        let outcome = submitter.run_iteration().await.unwrap();
        assert_eq!(outcome, IterationOutcome::Accepted);
    }

    let stats = runtime.stats().await;
    assert_eq!(stats.batches, 15);
    assert_eq!(stats.rejected, 0);
    assert!(
        (records + 10..=records + 50).contains(&stats.records),
        "records = {}",
        stats.records
    );
    assert!(!logs_contain("rejected with status"));
}

#[tokio::test]
#[tracing_test::traced_test]
async fn test_failing_sink_rejects_batches() {
    let runtime = e2e::runtime::spawn_with_args(&["--error-rate", "1.0"]).await;
    let submitter = BatchSubmitter::new(runtime.client(), runtime.logs_endpoint());

    let outcome = submitter.run_iteration().await.unwrap();
    assert_eq!(
        outcome,
        IterationOutcome::Rejected {
            status: StatusCode::INTERNAL_SERVER_ERROR
        }
    );
    assert!(logs_contain("500"));
    assert!(logs_contain("simulated ingest failure"));

    let stats = runtime.stats().await;
    assert_eq!(stats.batches, 0);
    assert_eq!(stats.rejected, 1);
}

#[tokio::test]
#[tracing_test::traced_test]
async fn test_sink_rejects_uncompressed_garbage() {
    let runtime = e2e::runtime::get().await;

    let resp = runtime
        .client()
        .post(runtime.logs_endpoint())
        .header("content-type", "application/json")
        .header("content-encoding", "gzip")
        .body(r#"[{"path":"not gzipped"}]"#)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let payload = resp.try_into_string().await.unwrap();
    assert!(payload.contains("malformed batch"), "payload = {payload}");
}

#[tokio::test]
async fn test_unreachable_sink_fails_iteration() {
    let runtime = e2e::runtime::get().await;

    // nothing listens on the discard port of the loopback interface
    let submitter = BatchSubmitter::new(
        runtime.client(),
        "http://127.0.0.1:9/logs".parse().unwrap(),
    );

    let result: Result<IterationOutcome, BoxError> = submitter.run_iteration().await;
    assert!(result.is_err());
}
