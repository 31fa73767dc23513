//! Application pool model

use super::{ensure, ensure_in_range, ensure_not_empty};
use crate::codec::{AppPoolState, CpuAction, IdentityType, IdleTimeoutAction, PipelineMode, StartMode};
use crate::Result;
use serde::{Deserialize, Serialize};

/// Managed runtime versions IIS accepts; empty means no managed code
pub const RUNTIME_VERSIONS: [&str; 3] = ["v4.0", "v2.0", ""];

/// Upper bound IIS enforces on second-granularity process model limits
pub const MAX_TIME_LIMIT_SECONDS: u32 = 4_294_967;

/// Worker process isolation unit, identified by name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationPool {
    pub name: String,
    /// Current runtime state, only present on values read from the host
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub state: Option<AppPoolState>,
    pub auto_start: bool,
    pub start_mode: StartMode,
    pub pipeline_mode: PipelineMode,
    pub runtime_version: String,
    pub enable_32bit_win64: bool,
    /// Requests HTTP.sys queues before answering 503
    pub queue_length: u32,
    pub process_model: ProcessModel,
    pub cpu: Cpu,
    pub recycling: Recycling,
    pub failure: Failure,
}

impl Default for ApplicationPool {
    fn default() -> Self {
        Self {
            name: String::new(),
            state: None,
            auto_start: true,
            start_mode: StartMode::OnDemand,
            pipeline_mode: PipelineMode::Integrated,
            runtime_version: "v4.0".to_string(),
            enable_32bit_win64: false,
            queue_length: 1000,
            process_model: ProcessModel::default(),
            cpu: Cpu::default(),
            recycling: Recycling::default(),
            failure: Failure::default(),
        }
    }
}

impl ApplicationPool {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure_not_empty("name", &self.name)?;
        ensure(self.start_mode != StartMode::Unknown, || "start_mode is not set".into())?;
        ensure(self.pipeline_mode != PipelineMode::Unknown, || {
            "pipeline_mode is not set".into()
        })?;
        ensure(RUNTIME_VERSIONS.contains(&self.runtime_version.as_str()), || {
            format!(
                "runtime_version must be one of {:?}, got '{}'",
                RUNTIME_VERSIONS, self.runtime_version
            )
        })?;
        ensure_in_range("queue_length", self.queue_length, 10, 65535)?;
        self.process_model.validate()?;
        self.cpu.validate()?;
        self.failure.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessModel {
    pub identity_type: IdentityType,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub load_user_profile: bool,
    /// Minutes
    pub idle_timeout: u32,
    pub idle_timeout_action: IdleTimeoutAction,
    /// More than one makes the pool a web garden
    pub max_processes: u32,
    pub pinging_enabled: bool,
    /// Seconds
    pub ping_interval: u32,
    /// Seconds
    pub ping_response_time: u32,
    /// Seconds
    pub startup_time_limit: u32,
    /// Seconds
    pub shutdown_time_limit: u32,
}

impl Default for ProcessModel {
    fn default() -> Self {
        Self {
            identity_type: IdentityType::ApplicationPoolIdentity,
            username: None,
            password: None,
            load_user_profile: true,
            idle_timeout: 20,
            idle_timeout_action: IdleTimeoutAction::Terminate,
            max_processes: 1,
            pinging_enabled: true,
            ping_interval: 30,
            ping_response_time: 90,
            startup_time_limit: 90,
            shutdown_time_limit: 90,
        }
    }
}

impl ProcessModel {
    fn validate(&self) -> Result<()> {
        ensure(self.identity_type != IdentityType::Unknown, || {
            "process_model.identity_type is not set".into()
        })?;
        if self.identity_type == IdentityType::SpecificUser {
            ensure(
                self.username.as_deref().is_some_and(|u| !u.is_empty()),
                || "process_model.username is required for SpecificUser".into(),
            )?;
        }
        ensure(self.idle_timeout_action != IdleTimeoutAction::Unknown, || {
            "process_model.idle_timeout_action is not set".into()
        })?;
        ensure_in_range("process_model.idle_timeout", self.idle_timeout, 0, 43_200)?;
        for (field, value) in [
            ("process_model.ping_interval", self.ping_interval),
            ("process_model.ping_response_time", self.ping_response_time),
            ("process_model.startup_time_limit", self.startup_time_limit),
            ("process_model.shutdown_time_limit", self.shutdown_time_limit),
        ] {
            ensure_in_range(field, value, 1, MAX_TIME_LIMIT_SECONDS)?;
        }
        Ok(())
    }
}

/// CPU limit and processor affinity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cpu {
    /// Thousandths of a percent of total CPU time; 0 disables the limit
    pub limit: u32,
    pub action: CpuAction,
    pub processor_affinity_enabled: bool,
    pub processor_affinity_mask32: u32,
    pub processor_affinity_mask64: u32,
}

impl Default for Cpu {
    fn default() -> Self {
        Self {
            limit: 0,
            action: CpuAction::NoAction,
            processor_affinity_enabled: false,
            processor_affinity_mask32: u32::MAX,
            processor_affinity_mask64: u32::MAX,
        }
    }
}

impl Cpu {
    fn validate(&self) -> Result<()> {
        ensure(self.action != CpuAction::Unknown, || "cpu.action is not set".into())?;
        ensure_in_range("cpu.limit", self.limit, 0, 100_000)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Recycling {
    pub disable_overlapped_recycle: bool,
    pub disable_recycle_on_config_change: bool,
    pub periodic_restart: PeriodicRestart,
}

/// Recycle thresholds; 0 disables each one
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriodicRestart {
    /// KB
    pub private_memory: u32,
    pub request_limit: u32,
    /// KB
    pub virtual_memory: u32,
}

/// Rapid-fail protection and orphaning hooks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Failure {
    pub rapid_fail_protection_enabled: bool,
    /// Minutes
    pub rapid_fail_protection_interval: u32,
    pub rapid_fail_protection_max_crashes: u32,
    pub orphan_worker_process_enabled: bool,
    pub orphan_action_exe: String,
    pub orphan_action_params: String,
    pub auto_shutdown_exe: String,
    pub auto_shutdown_params: String,
}

impl Default for Failure {
    fn default() -> Self {
        Self {
            rapid_fail_protection_enabled: true,
            rapid_fail_protection_interval: 5,
            rapid_fail_protection_max_crashes: 5,
            orphan_worker_process_enabled: false,
            orphan_action_exe: String::new(),
            orphan_action_params: String::new(),
            auto_shutdown_exe: String::new(),
            auto_shutdown_params: String::new(),
        }
    }
}

impl Failure {
    fn validate(&self) -> Result<()> {
        ensure_in_range(
            "failure.rapid_fail_protection_interval",
            self.rapid_fail_protection_interval,
            1,
            144_000,
        )?;
        ensure_in_range(
            "failure.rapid_fail_protection_max_crashes",
            self.rapid_fail_protection_max_crashes,
            1,
            2_147_483_647,
        )
    }
}
