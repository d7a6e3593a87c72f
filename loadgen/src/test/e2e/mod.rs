#![allow(unused)]

mod runtime;

mod test_run;
mod test_submit;

use rama::telemetry::tracing;

#[tokio::test]
#[tracing_test::traced_test]
async fn test_runtime_get() {
    // starting the shared mock sink and reading its address
    // should work regardless of what the other tests do with it

    let runtime = self::runtime::get().await;
    assert!(runtime.mock_socket_addr().ip_addr.is_loopback());
    assert_ne!(runtime.mock_socket_addr().port, 0);
}
