use std::{
    io::ErrorKind,
    path::PathBuf,
    sync::{Arc, LazyLock, OnceLock},
    time::Duration,
};

use clap::Parser;
use rama::{
    error::BoxError,
    http::{BodyExtractExt as _, Request, Response, Uri, service::client::HttpClientExt as _},
    net::address::SocketAddress,
    rt::Executor,
    service::BoxService,
};

use crate::{Args, cmd::mock::SinkStats};

#[derive(Clone)]
pub(super) struct Runtime {
    _app: App,

    mock_addr: SocketAddress,
}

impl Runtime {
    #[inline(always)]
    pub fn mock_socket_addr(&self) -> SocketAddress {
        self.mock_addr
    }

    pub fn base_url(&self) -> Uri {
        format!("http://{}", self.mock_addr)
            .parse()
            .expect("valid mock base url")
    }

    pub fn logs_endpoint(&self) -> Uri {
        format!("http://{}/logs", self.mock_addr)
            .parse()
            .expect("valid mock logs endpoint")
    }

    pub fn client(&self) -> BoxService<Request, Response, BoxError> {
        crate::cmd::run::client::http_client(Executor::default(), Duration::from_secs(30))
            .expect("create loadgen http client")
    }

    pub async fn stats(&self) -> SinkStats {
        self.client()
            .get(format!("http://{}/stats", self.mock_addr))
            .send()
            .await
            .unwrap()
            .try_into_json()
            .await
            .unwrap()
    }
}

#[derive(Clone)]
struct App {
    data_dir: PathBuf,
}

impl App {
    fn new() -> Self {
        let data_dir = spawn_mock_app_with_args(&[]);
        Self { data_dir }
    }
}

/// Shared mock sink with default behaviour.
///
/// Its counters are shared by all tests using it,
/// spawn a dedicated one to assert on `/stats`.
pub(super) async fn get() -> Runtime {
    static APP: LazyLock<App> = LazyLock::new(App::new);
    runtime_for(APP.clone()).await
}

pub(super) async fn spawn_with_args(extra_args: &[&str]) -> Runtime {
    let data_dir = spawn_mock_app_with_args(extra_args);
    runtime_for(App { data_dir }).await
}

async fn runtime_for(app: App) -> Runtime {
    let mock_addr = tokio::time::timeout(
        Duration::from_secs(60),
        read_file_or_wait(app.data_dir.join("mock.addr.txt")),
    )
    .await
    .unwrap();

    let runtime = Runtime {
        _app: app,
        mock_addr,
    };
    assert!(runtime.mock_socket_addr().ip_addr.is_loopback());

    runtime
}

async fn read_file_or_wait(path: PathBuf) -> SocketAddress {
    loop {
        match tokio::fs::read_to_string(&path).await {
            Ok(s) => match s.trim().parse() {
                Ok(addr) => return addr,
                Err(err) => {
                    eprintln!("mock addr file not (fully) written yet (content={s:?}): {err}");
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => (),
            Err(err) => panic!("unexpected error: {err}"),
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

fn spawn_mock_app_with_args(extra_args: &[&str]) -> PathBuf {
    let data_dir = crate::test::tmp_dir::try_new("decision_log_mock_e2e").unwrap();
    eprintln!("decision_log_mock_e2e data stored under: {data_dir:?}");

    let data_dir_str = data_dir.display().to_string();

    let mut argv: Vec<&str> = vec![
        crate::utils::env::project_name(),
        "mock",
        "--bind",
        "127.0.0.1:0",
        "--data",
        &data_dir_str,
        "--graceful",
        "0.42",
    ];
    argv.extend(extra_args);

    let args = Args::try_parse_from(argv).unwrap();

    let wait_server_ready = Arc::new(OnceLock::new());
    let notify_server_ready = wait_server_ready.clone();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let server_future = crate::run_with_args(std::future::pending::<()>(), args);

        notify_server_ready.set(()).expect("waiter to be notified");

        rt.block_on(server_future).expect("serve without errors");
    });

    wait_server_ready.wait();

    data_dir
}
