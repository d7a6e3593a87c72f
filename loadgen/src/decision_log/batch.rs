use rand::RngExt;
use serde::{Deserialize, Serialize};

use super::DecisionLogRecord;

/// Inclusive bounds of the amount of records sent in a single request.
pub const MIN_BATCH_SIZE: usize = 1;
pub const MAX_BATCH_SIZE: usize = 5;

/// Records posted together in one request.
///
/// Serializes as a bare JSON array, in generation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecisionLogBatch(Vec<DecisionLogRecord>);

impl DecisionLogBatch {
    /// Generate a batch with a uniformly random size
    /// in `[MIN_BATCH_SIZE, MAX_BATCH_SIZE]`.
    pub fn sample<R: RngExt>(rng: &mut R) -> Self {
        let size = rng.random_range(MIN_BATCH_SIZE..=MAX_BATCH_SIZE);
        Self::generate(size, rng)
    }

    pub fn generate<R: RngExt>(size: usize, rng: &mut R) -> Self {
        Self(
            (0..size)
                .map(|_| DecisionLogRecord::generate(rng))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn records(&self) -> &[DecisionLogRecord] {
        &self.0
    }

    pub fn to_json_vec(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(&self.0)
    }
}
