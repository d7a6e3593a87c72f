use std::{fmt, time::Duration};

use rama::error::BoxError;

/// Load profile properties.
///
/// Every property is optional here: the ones that are set on the
/// command line (or via the environment) overwrite the scenario preset.
#[derive(Debug, Clone, clap::Args, Default)]
pub struct ProfileConfig {
    /// Iterations started per time unit.
    #[arg(long, value_name = "N", env = "LOADGEN_RATE")]
    pub rate: Option<u32>,

    /// Period in which `rate` iterations are started (e.g. 1s, 500ms).
    #[arg(
        long,
        value_name = "DURATION",
        env = "LOADGEN_TIME_UNIT",
        value_parser = humantime::parse_duration,
    )]
    pub time_unit: Option<Duration>,

    /// Total time during which new iterations are started (e.g. 1m).
    #[arg(
        long,
        value_name = "DURATION",
        env = "LOADGEN_DURATION",
        value_parser = humantime::parse_duration,
    )]
    pub duration: Option<Duration>,

    /// Virtual users available from the start.
    #[arg(long, value_name = "N", env = "LOADGEN_PRE_ALLOCATED_VUS")]
    pub pre_allocated_vus: Option<u32>,

    /// Upper bound of virtual users, iterations beyond are dropped.
    #[arg(long, value_name = "N", env = "LOADGEN_MAX_VUS")]
    pub max_vus: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorKind {
    /// Start a fixed amount of iterations per time unit,
    /// independent of how long each iteration takes.
    ConstantArrivalRate,
}

impl fmt::Display for ExecutorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutorKind::ConstantArrivalRate => f.write_str("constant-arrival-rate"),
        }
    }
}

/// Fully resolved and validated load profile.
///
/// Built once before the run starts and handed to the executor,
/// it does not change while the run is in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadProfile {
    pub name: &'static str,
    pub executor: ExecutorKind,
    pub rate: u32,
    pub time_unit: Duration,
    pub duration: Duration,
    pub pre_allocated_vus: u32,
    pub max_vus: u32,
}

impl LoadProfile {
    pub fn try_new(
        name: &'static str,
        executor: ExecutorKind,
        cfg: ProfileConfig,
    ) -> Result<Self, BoxError> {
        fn required<T>(value: Option<T>, property: &str) -> Result<T, BoxError> {
            value.ok_or_else(|| format!("load profile property '{property}' is undefined").into())
        }

        let profile = Self {
            name,
            executor,
            rate: required(cfg.rate, "rate")?,
            time_unit: required(cfg.time_unit, "time_unit")?,
            duration: required(cfg.duration, "duration")?,
            pre_allocated_vus: required(cfg.pre_allocated_vus, "pre_allocated_vus")?,
            max_vus: required(cfg.max_vus, "max_vus")?,
        };

        if profile.rate == 0 {
            return Err(BoxError::from("load profile rate must be at least 1"));
        }
        if profile.time_unit.is_zero() {
            return Err(BoxError::from("load profile time unit must be non-zero"));
        }
        if profile.duration.is_zero() {
            return Err(BoxError::from("load profile duration must be non-zero"));
        }
        if profile.max_vus == 0 {
            return Err(BoxError::from("load profile max VUs must be at least 1"));
        }
        if profile.pre_allocated_vus > profile.max_vus {
            return Err(format!(
                "load profile pre-allocated VUs ({}) exceed max VUs ({})",
                profile.pre_allocated_vus, profile.max_vus
            )
            .into());
        }

        Ok(profile)
    }

    /// Amount of iterations the schedule will start if no arrival is dropped.
    ///
    /// The first arrival is due immediately, a partial interval at the end
    /// still starts one.
    pub fn expected_iterations(&self) -> u64 {
        let time_unit = self.time_unit.as_nanos();
        let iterations =
            (self.duration.as_nanos() * u128::from(self.rate)).div_ceil(time_unit);
        u64::try_from(iterations).unwrap_or(u64::MAX)
    }
}

impl fmt::Display for LoadProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {} per {} for {}, VUs {}..={}",
            self.name,
            self.executor,
            self.rate,
            humantime::format_duration(self.time_unit),
            humantime::format_duration(self.duration),
            self.pre_allocated_vus,
            self.max_vus,
        )
    }
}
