use rama::{
    Service,
    error::{BoxError, ErrorContext as _},
    http::{
        Request, Response, StatusCode, Uri,
        body::util::BodyExt as _,
        header::{CONTENT_ENCODING, CONTENT_TYPE},
        service::client::HttpClientExt as _,
    },
    telemetry::tracing,
};
use rand::{RngExt, SeedableRng as _, rngs::StdRng};

use crate::{decision_log::DecisionLogBatch, utils::gzip};

/// How a single iteration ended, from the point of view of the ingest service.
///
/// Transport failures are not an outcome, they are returned as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationOutcome {
    /// The batch was acknowledged with `204 No Content`.
    Accepted,
    /// Any other response status.
    Rejected { status: StatusCode },
}

/// Posts one freshly generated batch of decision logs per iteration.
///
/// Holds no per-iteration state: it can be cloned into every virtual user.
#[derive(Debug, Clone)]
pub struct BatchSubmitter<C> {
    client: C,
    endpoint: Uri,
}

impl<C> BatchSubmitter<C> {
    pub fn new(client: C, endpoint: Uri) -> Self {
        Self { client, endpoint }
    }

    pub fn endpoint(&self) -> &Uri {
        &self.endpoint
    }
}

impl<C> BatchSubmitter<C>
where
    C: Service<Request, Output = Response, Error = BoxError>,
{
    /// Generate a batch of random size and submit it.
    pub async fn run_iteration(&self) -> Result<IterationOutcome, BoxError> {
        // ThreadRng is not Send, only its seed crosses the await
        let mut rng = StdRng::from_rng(&mut rand::rng());
        self.run_iteration_with(&mut rng).await
    }

    /// Generate a batch of random size from `rng` and submit it.
    pub async fn run_iteration_with<R>(&self, rng: &mut R) -> Result<IterationOutcome, BoxError>
    where
        R: RngExt + Send,
    {
        let batch = DecisionLogBatch::sample(rng);
        self.submit(&batch).await
    }

    /// Submit a single batch as a gzip-compressed JSON array.
    ///
    /// Exactly one request is made, there are no retries.
    pub async fn submit(&self, batch: &DecisionLogBatch) -> Result<IterationOutcome, BoxError> {
        let payload = batch
            .to_json_vec()
            .context("json-encode decision log batch")
            .context_field("records", batch.len())?;
        let payload = gzip::compress(&payload)
            .context("gzip-compress decision log batch")
            .context_field("records", batch.len())?;

        let resp = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(CONTENT_ENCODING, "gzip")
            .body(payload)
            .send()
            .await
            .context("post decision log batch")
            .with_context_field("endpoint", || self.endpoint.clone())?;

        let status = resp.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(IterationOutcome::Accepted);
        }

        let body = match resp.into_body().collect().await {
            Ok(collected) => String::from_utf8_lossy(&collected.to_bytes()).into_owned(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };
        tracing::warn!(
            status = status.as_u16(),
            %body,
            "decision log batch rejected with status {}: {body}",
            status.as_u16(),
        );

        Ok(IterationOutcome::Rejected { status })
    }
}

impl<C> Service<()> for BatchSubmitter<C>
where
    C: Service<Request, Output = Response, Error = BoxError>,
{
    type Output = IterationOutcome;
    type Error = BoxError;

    async fn serve(&self, _: ()) -> Result<Self::Output, Self::Error> {
        self.run_iteration().await
    }
}
