/// Behaviour of the mock decision log sink.
/// This models ingest latency and an unhealthy upstream.
#[derive(Debug, Clone, clap::Args, Default)]
pub struct SinkConfig {
    /// Base processing time before responding.
    #[arg(long, value_name = "SECONDS")]
    pub base_latency: Option<f64>,

    /// Random delay added to or removed from base_latency.
    #[arg(long, value_name = "SECONDS")]
    pub jitter: Option<f64>,

    /// Probability of rejecting a valid batch with a 500 response.
    #[arg(long)]
    pub error_rate: Option<f32>,
}
