//! The dynamic spawn strategy.
//!
//! Tries to run a spawn on the local and the remote back-end at the same
//! time and picks whichever completes first. This gives the benefits of
//! remote execution on full builds and of local execution on incremental
//! builds. Spawns that only one side can execute fall through to that side
//! directly, and when the configured CPU budget for racing is exhausted,
//! additional spawns degrade to remote-only execution.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::actions::{
    execution_requirements, ActionExecutionContext, DynamicMode, ExecutionPolicy, Spawn,
    SpawnResult,
};
use crate::config::DynamicExecutionOptions;
use crate::dynamic::arbiter::{
    stop_concurrent_spawns_callback, wait_branches, StrategyThatCancelled,
};
use crate::dynamic::branch::BranchCore;
use crate::dynamic::local::LocalBranch;
use crate::dynamic::remote::RemoteBranch;
use crate::error::{DynamicExecutionCode, ExecError, ExecResult, FailureDetail};

/// Maps a spawn to the back-ends its execution requirements allow.
pub type GetExecutionPolicy = Box<dyn Fn(&Spawn) -> ExecutionPolicy + Send + Sync>;

pub struct DynamicSpawnStrategy {
    options: Arc<DynamicExecutionOptions>,
    get_execution_policy: GetExecutionPolicy,
    /// Set by the first remote completion; until then local attempts start
    /// immediately, afterwards they are delayed to let remote cache hits win.
    delay_local_execution: Arc<AtomicBool>,
    /// True if this is the first build since the server started.
    first_build: bool,
    skip_build_warning_shown: AtomicBool,
    /// Limits how many spawns may be racing on both back-ends at once.
    thread_limiter: Arc<Semaphore>,
}

impl DynamicSpawnStrategy {
    pub fn new(
        options: DynamicExecutionOptions,
        get_execution_policy: GetExecutionPolicy,
        first_build: bool,
        num_cpus: usize,
    ) -> Self {
        DynamicSpawnStrategy {
            options: Arc::new(options),
            get_execution_policy,
            delay_local_execution: Arc::new(AtomicBool::new(false)),
            first_build,
            skip_build_warning_shown: AtomicBool::new(false),
            thread_limiter: Arc::new(Semaphore::new(num_cpus)),
        }
    }

    /// Whether any back-end can run this spawn.
    pub fn can_exec(&self, spawn: &Spawn, ctx: &ActionExecutionContext) -> bool {
        let policy = (self.get_execution_policy)(spawn);
        Self::can_exec_local(spawn, policy, ctx) || Self::can_exec_remote(spawn, policy, ctx)
    }

    fn can_exec_local(
        spawn: &Spawn,
        policy: ExecutionPolicy,
        ctx: &ActionExecutionContext,
    ) -> bool {
        policy.can_run_locally
            && ctx
                .registry()
                .get_dynamic_strategies(spawn, DynamicMode::Local)
                .iter()
                .any(|s| {
                    s.can_exec(spawn, ctx) || s.can_exec_with_legacy_fallback(spawn, ctx)
                })
    }

    fn can_exec_remote(
        spawn: &Spawn,
        policy: ExecutionPolicy,
        ctx: &ActionExecutionContext,
    ) -> bool {
        policy.can_run_remotely
            && ctx
                .registry()
                .get_dynamic_strategies(spawn, DynamicMode::Remote)
                .iter()
                .any(|s| s.can_exec(spawn, ctx))
    }

    /// Execute a spawn, racing both back-ends when possible.
    pub async fn exec(
        &self,
        spawn: &Spawn,
        ctx: &Arc<ActionExecutionContext>,
    ) -> ExecResult<Vec<SpawnResult>> {
        verify_availability_info(&self.options, spawn)?;
        if let Some(results) = self.maybe_execute_non_dynamically(spawn, ctx).await? {
            return Ok(results);
        }

        // If there is no thread budget left for racing because we are limited
        // to the number of CPUs, just execute remotely.
        let permit = match self.thread_limiter.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                return RemoteBranch::run_remotely(spawn, ctx, None, &self.delay_local_execution)
                    .await
            }
        };

        tracing::debug!(spawn = %spawn.describe(), "dynamic execution beginning on both back-ends");

        let spawn_arc = Arc::new(spawn.clone());
        let strategy_that_cancelled = Arc::new(StrategyThatCancelled::new());
        let local_core = BranchCore::new(DynamicMode::Local, spawn_arc.clone());
        let remote_core = BranchCore::new(DynamicMode::Remote, spawn_arc.clone());

        let local_stop = stop_concurrent_spawns_callback(
            remote_core.clone(),
            local_core.clone(),
            strategy_that_cancelled.clone(),
            self.options.clone(),
            ctx.clone(),
        );
        let remote_stop = stop_concurrent_spawns_callback(
            local_core.clone(),
            remote_core.clone(),
            strategy_that_cancelled,
            self.options.clone(),
            ctx.clone(),
        );

        let local_branch = LocalBranch::submit(
            local_core.clone(),
            spawn_arc.clone(),
            ctx.clone(),
            self.options.clone(),
            self.delay_local_execution.clone(),
            local_stop,
        );
        let remote_branch = RemoteBranch::submit(
            remote_core.clone(),
            spawn_arc,
            ctx.clone(),
            self.delay_local_execution.clone(),
            remote_stop,
        );

        let result = wait_branches(local_branch, remote_branch, spawn, &self.options, ctx).await;

        assert!(
            local_core.state().is_terminal() && remote_core.state().is_terminal(),
            "dynamic execution of {} returned with a live branch: local {:?}, remote {:?}",
            spawn.pretty_print(),
            local_core.state(),
            remote_core.state()
        );
        tracing::debug!(
            spawn = %spawn.describe(),
            local = %if local_core.is_cancelled() { "cancelled" } else { "done" },
            remote = %if remote_core.is_cancelled() { "cancelled" } else { "done" },
            "dynamic execution ended"
        );

        drop(permit);
        result
    }

    /// Forwards the used-context notification to the registry.
    pub fn used_context(&self, ctx: &ActionExecutionContext) {
        ctx.registry().notify_used_dynamic();
    }

    /// Checks whether this spawn must be executed on one specific side, and
    /// if so runs it there. Returns `None` when the spawn should be executed
    /// dynamically.
    async fn maybe_execute_non_dynamically(
        &self,
        spawn: &Spawn,
        ctx: &ActionExecutionContext,
    ) -> ExecResult<Option<Vec<SpawnResult>>> {
        let policy = (self.get_execution_policy)(spawn);
        let local_can_exec = Self::can_exec_local(spawn, policy, ctx);
        let remote_can_exec = Self::can_exec_remote(spawn, policy, ctx);

        match (local_can_exec, remote_can_exec) {
            (false, false) => {
                tracing::debug!(
                    spawn = %spawn.pretty_print(),
                    "dynamic execution possible neither locally nor remotely"
                );
                Err(ExecError::User(FailureDetail::new(
                    no_can_exec_failure_message(spawn, policy),
                    DynamicExecutionCode::NoUsableStrategyFound,
                )))
            }
            (false, true) => {
                tracing::debug!(
                    spawn = %spawn.pretty_print(),
                    allowed = policy.can_run_locally,
                    "dynamic execution can only be done remotely"
                );
                RemoteBranch::run_remotely(spawn, ctx, None, &self.delay_local_execution)
                    .await
                    .map(Some)
            }
            (true, false) => {
                tracing::debug!(
                    spawn = %spawn.pretty_print(),
                    allowed = policy.can_run_remotely,
                    "dynamic execution can only be done locally"
                );
                LocalBranch::run_locally(spawn, ctx, None).await.map(Some)
            }
            (true, true) if self.options.skip_first_build && self.first_build => {
                if !self.skip_build_warning_shown.swap(true, Ordering::AcqRel) {
                    ctx.event_emitter().info(
                        "Disabling dynamic execution until a successful build has been seen",
                    );
                }
                RemoteBranch::run_remotely(spawn, ctx, None, &self.delay_local_execution)
                    .await
                    .map(Some)
            }
            (true, true) => Ok(None),
        }
    }
}

impl fmt::Display for DynamicSpawnStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dynamic")
    }
}

/// Checks that a spawn carrying a platform-specific requirement also carries
/// the marker proving its requirements were resolved, so it cannot end up on
/// a back-end that would build for the wrong platform.
fn verify_availability_info(
    options: &DynamicExecutionOptions,
    spawn: &Spawn,
) -> ExecResult<()> {
    if !options.require_availability_info
        || options.availability_info_exempt.contains(&spawn.mnemonic)
    {
        return Ok(());
    }
    if spawn
        .execution_info
        .contains_key(execution_requirements::REQUIRES_DARWIN)
        && !spawn
            .execution_info
            .contains_key(execution_requirements::REQUIREMENTS_SET)
    {
        let message = format!(
            "The following spawn was missing platform-related execution requirements. \
             You can work around this error by disabling require_availability_info at \
             your own risk; this may cause some actions to be executed on the wrong \
             platform.\n\
             Failing spawn: mnemonic = {}\n\
             tool files = {:?}\n\
             execution platform = {:?}\n\
             execution info = {:?}",
            spawn.mnemonic, spawn.tool_files, spawn.execution_platform, spawn.execution_info
        );
        return Err(ExecError::Environmental(FailureDetail::new(
            message,
            DynamicExecutionCode::XcodeRelatedPrereqUnmet,
        )));
    }
    Ok(())
}

/// Error text for the case where neither side can take the spawn, selected
/// by which side was forbidden by the execution policy.
fn no_can_exec_failure_message(spawn: &Spawn, policy: ExecutionPolicy) -> String {
    match (policy.can_run_locally, policy.can_run_remotely) {
        (false, false) => format!(
            "Neither local nor remote execution allowed for action {}",
            spawn.mnemonic
        ),
        (true, false) => format!(
            "No usable dynamic local strategy found (and remote execution disabled) for action {}",
            spawn.mnemonic
        ),
        (false, true) => format!(
            "No usable dynamic remote strategy found (and local execution disabled) for action {}",
            spawn.mnemonic
        ),
        (true, true) => format!(
            "No usable dynamic local or remote strategy found for action {}",
            spawn.mnemonic
        ),
    }
}
