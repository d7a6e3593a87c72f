use std::time::Duration;

use rama::{
    error::{BoxError, ErrorContext as _},
    http::Uri,
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Path, relative to the base URL, that ingests decision log batches.
const LOGS_PATH: &str = "/logs";

/// The decision log service under load.
#[derive(Debug, Clone, clap::Args)]
pub struct TargetConfig {
    /// Base URL of the decision log service; batches are posted to `<URL>/logs`.
    #[arg(
        long,
        value_name = "URL",
        env = "LOADGEN_BASE_URL",
        default_value = DEFAULT_BASE_URL,
    )]
    pub base_url: Uri,

    /// Time after which a single request is given up on.
    #[arg(
        long,
        value_name = "DURATION",
        env = "LOADGEN_REQUEST_TIMEOUT",
        default_value = "60s",
        value_parser = humantime::parse_duration,
    )]
    pub timeout: Duration,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: Uri::from_static(DEFAULT_BASE_URL),
            timeout: Duration::from_secs(60),
        }
    }
}

impl TargetConfig {
    /// The ingest endpoint: the base URL with `/logs` appended to its path.
    pub fn logs_endpoint(&self) -> Result<Uri, BoxError> {
        let (Some(scheme), Some(authority)) = (self.base_url.scheme(), self.base_url.authority())
        else {
            return Err(format!(
                "base url '{}' requires both a scheme and a host",
                self.base_url
            )
            .into());
        };

        let base_path = self.base_url.path().trim_end_matches('/');
        format!("{scheme}://{authority}{base_path}{LOGS_PATH}")
            .parse::<Uri>()
            .context("build logs endpoint from base url")
            .with_context_field("base_url", || self.base_url.clone())
    }

    pub fn request_timeout(&self) -> Result<Duration, BoxError> {
        if self.timeout.is_zero() {
            return Err(BoxError::from("request timeout must be non-zero"));
        }
        Ok(self.timeout)
    }
}
