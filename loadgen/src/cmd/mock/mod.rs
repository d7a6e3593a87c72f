use std::{
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use rama::{
    Layer as _,
    error::{BoxError, ErrorContext as _},
    graceful::ShutdownGuard,
    http::{
        HeaderValue, Request, Response, StatusCode,
        body::util::BodyExt as _,
        header::CONTENT_ENCODING,
        layer::{required_header::AddRequiredResponseHeadersLayer, trace::TraceLayer},
        server::HttpServer,
        service::web::{
            Router,
            response::{IntoResponse as _, Json},
        },
    },
    layer::TimeoutLayer,
    net::{address::SocketAddress, socket::Interface},
    rt::Executor,
    tcp::server::TcpListener,
    telemetry::tracing,
};

use clap::Args;
use serde::{Deserialize, Serialize};

use crate::{
    config::SinkConfig,
    decision_log::DecisionLogBatch,
    utils::{env::network_service_identifier, gzip},
};

#[derive(Debug, Clone, Args)]
/// run a mock decision log ingest service
pub struct MockCommand {
    #[clap(flatten)]
    config: SinkConfig,

    /// network interface to bind to
    #[arg(
        long,
        short = 'b',
        value_name = "INTERFACE",
        default_value = "127.0.0.1:8080"
    )]
    pub bind: Interface,

    /// directory to write the bound address to (as `mock.addr.txt`)
    #[arg(long, value_name = "DIR")]
    pub data: Option<PathBuf>,

    /// close client connections after this long (e.g. 5m),
    /// pooled connections of a load run are kept open when not set
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    pub connection_timeout: Option<Duration>,
}

pub async fn exec(guard: ShutdownGuard, args: MockCommand) -> Result<(), BoxError> {
    let sink = Arc::new(MockLogSink::try_new(args.config)?);

    let http_router = Router::new()
        .with_post("/logs", {
            let sink = sink.clone();
            move |req: Request| {
                let sink = sink.clone();
                async move { sink.ingest(req).await }
            }
        })
        .with_get("/stats", move || std::future::ready(sink.stats_response()));

    let http_svc = (
        TraceLayer::new_for_http(),
        AddRequiredResponseHeadersLayer::new()
            .with_server_header_value(HeaderValue::from_static(network_service_identifier())),
    )
        .into_layer(http_router);

    let exec = Executor::graceful(guard);
    let http_server = HttpServer::auto(exec.clone()).service(Arc::new(http_svc));

    let tcp_listener = TcpListener::bind(args.bind, exec)
        .await
        .context("bind mock log sink http server")?;

    let sink_addr = tcp_listener
        .local_addr()
        .context("get bound address for mock log sink http server")?;

    tracing::info!("mock log sink bound to: {sink_addr}");
    if let Some(data) = args.data.as_deref() {
        tokio::fs::create_dir_all(data)
            .await
            .context("create data directory")
            .with_context_debug_field("path", || data.to_owned())?;
        write_server_socket_address_as_file(data, "mock", sink_addr.into()).await?;
    }

    match args.connection_timeout {
        Some(timeout) => {
            tracing::info!("mock log sink closes connections after {timeout:?}");
            tcp_listener
                .serve(TimeoutLayer::new(timeout).into_layer(http_server))
                .await;
        }
        None => tcp_listener.serve(http_server).await,
    }

    Ok(())
}

async fn write_server_socket_address_as_file(
    dir: &Path,
    name: &str,
    addr: SocketAddress,
) -> Result<(), BoxError> {
    let path = dir.join(format!("{name}.addr.txt"));
    tokio::fs::write(&path, addr.to_string())
        .await
        .context("write server's socket address to file")
        .context_field("address", addr)
        .with_context_debug_field("path", || path.to_owned())
}

/// Counters exposed on `GET /stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkStats {
    /// Batches acknowledged with `204`.
    pub batches: u64,
    /// Records contained in the acknowledged batches.
    pub records: u64,
    /// Requests answered with an error status, malformed or not.
    pub rejected: u64,
}

#[derive(Debug)]
struct MockLogSink {
    base_latency: f64,
    jitter: f64,
    error_rate: f32,

    batches: AtomicU64,
    records: AtomicU64,
    rejected: AtomicU64,
}

impl MockLogSink {
    fn try_new(cfg: SinkConfig) -> Result<Self, BoxError> {
        let base_latency = cfg.base_latency.unwrap_or_default();
        let jitter = cfg.jitter.unwrap_or_default();
        let error_rate = cfg.error_rate.unwrap_or_default();

        if !(0.0..=1.0).contains(&error_rate) {
            return Err(BoxError::from("error_rate must be within [0.0, 1.0]"));
        }

        Ok(Self {
            base_latency,
            jitter,
            error_rate,
            batches: AtomicU64::new(0),
            records: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        })
    }

    fn should_fail(&self) -> bool {
        self.error_rate > 0. && rand::random::<f32>() < self.error_rate
    }

    fn compute_delay(&self) -> Duration {
        let base = self.base_latency.max(0.0);
        let jitter = self.jitter.max(0.0);

        if jitter == 0.0 {
            return Duration::from_secs_f64(base);
        }

        let u: f64 = rand::random();
        let delta = (u * jitter * 2.0) - jitter;
        Duration::from_secs_f64((base + delta).max(0.0))
    }

    async fn ingest(&self, req: Request) -> Response {
        let batch = match decode_batch(req).await {
            Ok(batch) => batch,
            Err(err) => {
                tracing::debug!("reject malformed decision log batch: {err}");
                self.rejected.fetch_add(1, Ordering::Relaxed);
                return (StatusCode::BAD_REQUEST, format!("malformed batch: {err}")).into_response();
            }
        };

        let delay = self.compute_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.should_fail() {
            self.rejected.fetch_add(1, Ordering::Relaxed);
            return (StatusCode::INTERNAL_SERVER_ERROR, "simulated ingest failure").into_response();
        }

        self.batches.fetch_add(1, Ordering::Relaxed);
        self.records
            .fetch_add(batch.len() as u64, Ordering::Relaxed);
        StatusCode::NO_CONTENT.into_response()
    }

    fn stats(&self) -> SinkStats {
        SinkStats {
            batches: self.batches.load(Ordering::Relaxed),
            records: self.records.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }

    fn stats_response(&self) -> Response {
        Json(self.stats()).into_response()
    }
}

async fn decode_batch(req: Request) -> Result<DecisionLogBatch, BoxError> {
    let gzipped = req
        .headers()
        .get(CONTENT_ENCODING)
        .is_some_and(|v| v.as_bytes().eq_ignore_ascii_case(b"gzip"));

    let payload = req
        .into_body()
        .collect()
        .await
        .context("collect request body")?
        .to_bytes();

    let batch: DecisionLogBatch = if gzipped {
        let payload = gzip::decompress(&payload).context("gunzip request body")?;
        serde_json::from_slice(&payload).context("json-decode gunzipped request body")?
    } else {
        serde_json::from_slice(&payload).context("json-decode request body")?
    };

    if batch.is_empty() {
        return Err(BoxError::from("empty batch"));
    }
    if let Some(record) = batch
        .records()
        .iter()
        .find(|record| !record.access_token_matches_decision())
    {
        return Err(format!(
            "access token of decision '{}' does not match its decision id",
            record.decision_id
        )
        .into());
    }
    Ok(batch)
}
