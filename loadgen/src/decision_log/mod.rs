//! Synthetic decision log records, as produced by a policy agent
//! evaluating a device posture report.
//!
//! Everything in here is fabricated test data: the fixtures are static,
//! only the identifiers, the request id and the timestamp vary per record.

mod batch;
mod record;

pub use self::{
    batch::{DecisionLogBatch, MAX_BATCH_SIZE, MIN_BATCH_SIZE},
    record::{
        AccessKey, AgentData, AntivirusEntry, DecisionInput, DecisionLogRecord, DecisionResult,
        DevicePosture, FileEntry, Labels, PolicyData, PolicyEvaluation, ProcessEntry, REQ_ID_MAX,
        REQ_ID_MIN, Score,
    },
};
