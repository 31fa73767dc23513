//! Application pool repository

use super::rollback::{configure_or_remove, update_with_rollback};
use super::{decode, non_empty, Repository};
use crate::codec::{
    duration, ordinal, AppPoolState, CpuAction, Granularity, IdentityType, IdleTimeoutAction,
    PipelineMode, StartMode,
};
use crate::error::EntityKind;
use crate::models::{ApplicationPool, Cpu, Failure, PeriodicRestart, ProcessModel, Recycling};
use crate::script::{ItemPath, Query, Script, Statement, Value};
use crate::transport::Transport;
use crate::{Error, Result};
use serde::Deserialize;

/// `Get-IISAppPool` response shape
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApplicationPoolResponse {
    name: String,
    #[serde(default, deserialize_with = "ordinal::deserialize")]
    state: AppPoolState,
    #[serde(default)]
    auto_start: bool,
    #[serde(default, deserialize_with = "ordinal::deserialize")]
    start_mode: StartMode,
    #[serde(rename = "ManagedPipelineMode", default, deserialize_with = "ordinal::deserialize")]
    pipeline_mode: PipelineMode,
    #[serde(default)]
    managed_runtime_version: String,
    #[serde(rename = "Enable32BitAppOnWin64", default)]
    enable_32bit_win64: bool,
    #[serde(default)]
    queue_length: u32,
    #[serde(default)]
    cpu: CpuResponse,
    #[serde(default)]
    process_model: ProcessModelResponse,
    #[serde(default)]
    recycling: RecyclingResponse,
    #[serde(default)]
    failure: FailureResponse,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ProcessModelResponse {
    #[serde(deserialize_with = "ordinal::deserialize")]
    identity_type: IdentityType,
    user_name: String,
    password: String,
    load_user_profile: bool,
    #[serde(deserialize_with = "duration::minutes")]
    idle_timeout: u32,
    #[serde(deserialize_with = "ordinal::deserialize")]
    idle_timeout_action: IdleTimeoutAction,
    max_processes: u32,
    pinging_enabled: bool,
    #[serde(deserialize_with = "duration::seconds")]
    ping_interval: u32,
    #[serde(deserialize_with = "duration::seconds")]
    ping_response_time: u32,
    #[serde(deserialize_with = "duration::seconds")]
    startup_time_limit: u32,
    #[serde(deserialize_with = "duration::seconds")]
    shutdown_time_limit: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct CpuResponse {
    limit: u32,
    #[serde(deserialize_with = "ordinal::deserialize")]
    action: CpuAction,
    smp_affinitized: bool,
    smp_processor_affinity_mask: u32,
    #[serde(rename = "SmpProcessorAffinityMask2")]
    smp_processor_affinity_mask2: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct RecyclingResponse {
    disallow_overlapping_rotation: bool,
    disallow_rotation_on_config_change: bool,
    periodic_restart: PeriodicRestartResponse,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct PeriodicRestartResponse {
    memory: u32,
    private_memory: u32,
    requests: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct FailureResponse {
    rapid_fail_protection: bool,
    #[serde(deserialize_with = "duration::minutes")]
    rapid_fail_protection_interval: u32,
    rapid_fail_protection_max_crashes: u32,
    orphan_worker_process: bool,
    orphan_action_exe: String,
    orphan_action_params: String,
    auto_shutdown_exe: String,
    auto_shutdown_params: String,
}

impl From<ApplicationPoolResponse> for ApplicationPool {
    fn from(response: ApplicationPoolResponse) -> Self {
        let pm = response.process_model;
        let cpu = response.cpu;
        let recycling = response.recycling;
        let failure = response.failure;

        Self {
            name: response.name,
            state: Some(response.state),
            auto_start: response.auto_start,
            start_mode: response.start_mode,
            pipeline_mode: response.pipeline_mode,
            runtime_version: response.managed_runtime_version,
            enable_32bit_win64: response.enable_32bit_win64,
            queue_length: response.queue_length,
            process_model: ProcessModel {
                identity_type: pm.identity_type,
                username: non_empty(pm.user_name),
                password: non_empty(pm.password),
                load_user_profile: pm.load_user_profile,
                idle_timeout: pm.idle_timeout,
                idle_timeout_action: pm.idle_timeout_action,
                max_processes: pm.max_processes,
                pinging_enabled: pm.pinging_enabled,
                ping_interval: pm.ping_interval,
                ping_response_time: pm.ping_response_time,
                startup_time_limit: pm.startup_time_limit,
                shutdown_time_limit: pm.shutdown_time_limit,
            },
            cpu: Cpu {
                limit: cpu.limit,
                action: cpu.action,
                processor_affinity_enabled: cpu.smp_affinitized,
                processor_affinity_mask32: cpu.smp_processor_affinity_mask,
                processor_affinity_mask64: cpu.smp_processor_affinity_mask2,
            },
            recycling: Recycling {
                disable_overlapped_recycle: recycling.disallow_overlapping_rotation,
                disable_recycle_on_config_change: recycling.disallow_rotation_on_config_change,
                periodic_restart: PeriodicRestart {
                    private_memory: recycling.periodic_restart.private_memory,
                    request_limit: recycling.periodic_restart.requests,
                    virtual_memory: recycling.periodic_restart.memory,
                },
            },
            failure: Failure {
                rapid_fail_protection_enabled: failure.rapid_fail_protection,
                rapid_fail_protection_interval: failure.rapid_fail_protection_interval,
                rapid_fail_protection_max_crashes: failure.rapid_fail_protection_max_crashes,
                orphan_worker_process_enabled: failure.orphan_worker_process,
                orphan_action_exe: failure.orphan_action_exe,
                orphan_action_params: failure.orphan_action_params,
                auto_shutdown_exe: failure.auto_shutdown_exe,
                auto_shutdown_params: failure.auto_shutdown_params,
            },
        }
    }
}

/// Every writable pool property as one script
pub(crate) fn configure_script(pool: &ApplicationPool) -> Script {
    let path = ItemPath::AppPool(pool.name.clone());
    let pm = &pool.process_model;
    let set = |property, value: Value| Statement::set(&path, property, value);

    let statements = [
        set("autoStart", pool.auto_start.into()),
        set("startMode", pool.start_mode.as_str().into()),
        set("managedPipelineMode", pool.pipeline_mode.as_str().into()),
        set("managedRuntimeVersion", pool.runtime_version.as_str().into()),
        set("enable32BitAppOnWin64", pool.enable_32bit_win64.into()),
        set("queueLength", pool.queue_length.into()),
        set("processModel.identityType", pm.identity_type.as_str().into()),
        set("processModel.userName", pm.username.clone().unwrap_or_default().into()),
        set("processModel.password", pm.password.clone().unwrap_or_default().into()),
        set("processModel.loadUserProfile", pm.load_user_profile.into()),
        set("processModel.idleTimeout", Value::Duration(pm.idle_timeout, Granularity::Minutes)),
        set("processModel.idleTimeoutAction", pm.idle_timeout_action.as_str().into()),
        set("processModel.maxProcesses", pm.max_processes.into()),
        set("processModel.pingingEnabled", pm.pinging_enabled.into()),
        set("processModel.pingInterval", Value::Duration(pm.ping_interval, Granularity::Seconds)),
        set("processModel.pingResponseTime", Value::Duration(pm.ping_response_time, Granularity::Seconds)),
        set("processModel.startupTimeLimit", Value::Duration(pm.startup_time_limit, Granularity::Seconds)),
        set("processModel.shutdownTimeLimit", Value::Duration(pm.shutdown_time_limit, Granularity::Seconds)),
        set("cpu.limit", pool.cpu.limit.into()),
        set("cpu.action", pool.cpu.action.as_str().into()),
        set("cpu.smpAffinitized", pool.cpu.processor_affinity_enabled.into()),
        set("cpu.smpProcessorAffinityMask", pool.cpu.processor_affinity_mask32.into()),
        set("cpu.smpProcessorAffinityMask2", pool.cpu.processor_affinity_mask64.into()),
        set("recycling.disallowOverlappingRotation", pool.recycling.disable_overlapped_recycle.into()),
        set("recycling.disallowRotationOnConfigChange", pool.recycling.disable_recycle_on_config_change.into()),
        set("recycling.periodicRestart.privateMemory", pool.recycling.periodic_restart.private_memory.into()),
        set("recycling.periodicRestart.requests", pool.recycling.periodic_restart.request_limit.into()),
        set("recycling.periodicRestart.memory", pool.recycling.periodic_restart.virtual_memory.into()),
        set("failure.rapidFailProtection", pool.failure.rapid_fail_protection_enabled.into()),
        set(
            "failure.rapidFailProtectionInterval",
            Value::Duration(pool.failure.rapid_fail_protection_interval, Granularity::Minutes),
        ),
        set("failure.rapidFailProtectionMaxCrashes", pool.failure.rapid_fail_protection_max_crashes.into()),
        set("failure.orphanWorkerProcess", pool.failure.orphan_worker_process_enabled.into()),
        set("failure.orphanActionExe", pool.failure.orphan_action_exe.as_str().into()),
        set("failure.orphanActionParams", pool.failure.orphan_action_params.as_str().into()),
        set("failure.autoShutdownExe", pool.failure.auto_shutdown_exe.as_str().into()),
        set("failure.autoShutdownParams", pool.failure.auto_shutdown_params.as_str().into()),
    ];

    statements
        .into_iter()
        .fold(Script::web_administration(), Script::with)
}

/// Application pools on the host
pub struct AppPools<'a, T: Transport> {
    transport: &'a T,
}

impl<'a, T: Transport> AppPools<'a, T> {
    pub fn new(transport: &'a T) -> Self {
        Self { transport }
    }

    fn apply(&self, pool: &ApplicationPool) -> Result<()> {
        self.transport.execute(&configure_script(pool).render())?;
        Ok(())
    }
}

impl<T: Transport> Repository for AppPools<'_, T> {
    type Entity = ApplicationPool;
    type Id = str;

    fn get(&self, name: &str) -> Result<ApplicationPool> {
        let script = Script::from(Statement::Query(Query::AppPool(name.to_string())));
        let output = self.transport.execute(&script.render())?;
        let response: ApplicationPoolResponse = decode(&output)?
            .ok_or_else(|| Error::not_found(EntityKind::ApplicationPool, name))?;
        Ok(response.into())
    }

    fn create(&self, desired: &ApplicationPool) -> Result<ApplicationPool> {
        let name = desired.name.as_str();
        let script = Script::web_administration().with(Statement::NewAppPool(name.to_string()));
        self.transport.execute(&script.render())?;

        configure_or_remove(
            EntityKind::ApplicationPool,
            name,
            || self.apply(desired),
            || self.delete(name),
        )?;

        tracing::info!(pool = %name, "Application pool created");
        self.get(name)
    }

    fn update(&self, desired: &ApplicationPool) -> Result<()> {
        let snapshot = self.get(&desired.name)?;
        update_with_rollback(
            EntityKind::ApplicationPool,
            &desired.name,
            &snapshot,
            desired,
            |pool| self.apply(pool),
        )?;

        tracing::info!(pool = %desired.name, "Application pool updated");
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<()> {
        let script = Script::web_administration().with(Statement::RemoveAppPool(name.to_string()));
        self.transport.execute(&script.render())?;
        tracing::info!(pool = %name, "Application pool deleted");
        Ok(())
    }
}
