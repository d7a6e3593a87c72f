mod profile;
mod scenario;
mod sink;
mod target;

pub use self::{
    profile::{ExecutorKind, LoadProfile, ProfileConfig},
    scenario::Scenario,
    sink::SinkConfig,
    target::TargetConfig,
};
