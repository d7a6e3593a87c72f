use std::time::Duration;

use super::{ExecutorKind, ProfileConfig};

/// Named load profiles.
/// Each scenario is a preset of the arrival rate and the virtual user pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, Default)]
pub enum Scenario {
    /// Sustained ingest load: 1000 batches per second for one minute.
    #[default]
    Normal,

    /// A single batch per second for a few seconds.
    /// Used to check connectivity with the target before a real run.
    Smoke,
}

impl Scenario {
    pub fn name(self) -> &'static str {
        match self {
            Scenario::Normal => "normal",
            Scenario::Smoke => "smoke",
        }
    }

    pub fn executor(self) -> ExecutorKind {
        match self {
            Scenario::Normal | Scenario::Smoke => ExecutorKind::ConstantArrivalRate,
        }
    }

    /// Construct the load profile properties
    /// associated with this scenario.
    pub fn profile_config(self) -> ProfileConfig {
        match self {
            Scenario::Normal => ProfileConfig {
                rate: Some(1000),
                time_unit: Some(Duration::from_secs(1)),
                duration: Some(Duration::from_secs(60)),
                pre_allocated_vus: Some(30),
                max_vus: Some(50),
            },

            Scenario::Smoke => ProfileConfig {
                rate: Some(1),
                time_unit: Some(Duration::from_secs(1)),
                duration: Some(Duration::from_secs(10)),
                pre_allocated_vus: Some(1),
                max_vus: Some(1),
            },
        }
    }
}
