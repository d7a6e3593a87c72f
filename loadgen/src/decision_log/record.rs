use std::{
    net::{IpAddr, Ipv4Addr},
    time::SystemTime,
};

use rand::RngExt;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const POLICY_PATH: &str = "cloud_access/device_posture/response";
const AGENT_VERSION: &str = "1.10.1";
const ACCESS_TOKEN_PREFIX: &str = "test_token_";
const REQUESTED_BY: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 100));

/// Inclusive bounds of the (low entropy) request correlation id.
pub const REQ_ID_MIN: u32 = 1;
pub const REQ_ID_MAX: u32 = 10_000;

/// One decision log entry as it is sent to the ingest endpoint.
///
/// Field order is the wire order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionLogRecord {
    pub path: String,
    pub input: DecisionInput,
    pub labels: Labels,
    pub req_id: u32,
    pub result: DecisionResult,
    pub bundles: serde_json::Map<String, serde_json::Value>,
    /// RFC 3339 UTC timestamp with millisecond precision.
    pub timestamp: String,
    pub decision_id: Uuid,
    pub requested_by: IpAddr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionInput {
    pub agent_data: AgentData,
    /// `test_token_` followed by the decision id of the same record.
    pub access_token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentData {
    pub data: DevicePosture,
    pub event_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevicePosture {
    pub os_type: String,
    pub file_list: Vec<FileEntry>,
    pub process_list: Vec<ProcessEntry>,
    pub registry_list: Vec<serde_json::Value>,
    pub antivirus_list: Vec<AntivirusEntry>,
    pub client_ip_hash_list: Vec<String>,
    pub client_mac_hash_list: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessEntry {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AntivirusEntry {
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Labels {
    pub id: Uuid,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionResult {
    pub allow: bool,
    pub score: Score,
    pub policies: Vec<PolicyEvaluation>,
    pub access_key: AccessKey,
    pub violations: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub grade: String,
    pub score: u32,
    pub max_score: u32,
    pub threshold: u32,
    pub risk_level: String,
    pub passes_threshold: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyEvaluation {
    pub policy_name: String,
    pub policy_data: PolicyData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyData {
    pub allow: bool,
    pub violations: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessKey {
    pub user_id: Uuid,
    pub realm_id: Uuid,
    pub user_policy_id: Uuid,
}

impl DecisionLogRecord {
    /// Fabricate a new record.
    ///
    /// All identifiers are fresh v4 UUIDs, `req_id` is drawn from the given rng
    /// and `timestamp` is the wall clock time of this call.
    pub fn generate<R: RngExt>(rng: &mut R) -> Self {
        let decision_id = Uuid::new_v4();

        Self {
            path: POLICY_PATH.to_owned(),
            input: DecisionInput {
                agent_data: AgentData {
                    data: DevicePosture::fixture(),
                    event_type: "device_posture_reported".to_owned(),
                },
                access_token: format!("{ACCESS_TOKEN_PREFIX}{decision_id}"),
            },
            labels: Labels {
                id: Uuid::new_v4(),
                version: AGENT_VERSION.to_owned(),
            },
            req_id: rng.random_range(REQ_ID_MIN..=REQ_ID_MAX),
            result: DecisionResult {
                allow: true,
                score: Score {
                    grade: "A".to_owned(),
                    score: 100,
                    max_score: 100,
                    threshold: 70,
                    risk_level: "low".to_owned(),
                    passes_threshold: true,
                },
                policies: vec![PolicyEvaluation {
                    policy_name: "vaccine_policy".to_owned(),
                    policy_data: PolicyData {
                        allow: true,
                        violations: Vec::new(),
                    },
                }],
                access_key: AccessKey {
                    user_id: Uuid::new_v4(),
                    realm_id: Uuid::new_v4(),
                    user_policy_id: Uuid::new_v4(),
                },
                violations: Vec::new(),
            },
            bundles: serde_json::Map::new(),
            timestamp: humantime::format_rfc3339_millis(SystemTime::now()).to_string(),
            decision_id,
            requested_by: REQUESTED_BY,
        }
    }

    /// Whether `input.access_token` points back at this record's decision.
    pub fn access_token_matches_decision(&self) -> bool {
        self.input
            .access_token
            .strip_prefix(ACCESS_TOKEN_PREFIX)
            .is_some_and(|id| id == self.decision_id.to_string())
    }
}

impl DevicePosture {
    fn fixture() -> Self {
        Self {
            os_type: "Windows".to_owned(),
            file_list: vec![FileEntry {
                path: "/etc/vaccine".to_owned(),
            }],
            process_list: vec![ProcessEntry {
                name: "antivirus".to_owned(),
                path: r"C:\Program Files\Antivirus\av.exe".to_owned(),
            }],
            registry_list: Vec::new(),
            antivirus_list: vec![AntivirusEntry {
                display_name: "security_center".to_owned(),
            }],
            client_ip_hash_list: vec!["ip_hash".to_owned()],
            client_mac_hash_list: vec!["mac_hash".to_owned()],
        }
    }
}
