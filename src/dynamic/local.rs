//! The local side of a dynamic execution.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::actions::{
    ActionExecutionContext, DynamicMode, Spawn, SpawnResult, StopConcurrentSpawns,
};
use crate::config::DynamicExecutionOptions;
use crate::dynamic::branch::{self, BranchCore, BranchHandle};
use crate::error::ExecResult;

pub struct LocalBranch;

impl LocalBranch {
    /// Launch the local branch task. While remote executions have been
    /// completing, the local attempt is delayed to give the remote side a
    /// chance to score a cache hit before a local process is started.
    pub(crate) fn submit(
        core: Arc<BranchCore>,
        spawn: Arc<Spawn>,
        ctx: Arc<ActionExecutionContext>,
        options: Arc<DynamicExecutionOptions>,
        delay_local_execution: Arc<AtomicBool>,
        stop_concurrent_spawns: StopConcurrentSpawns,
    ) -> BranchHandle {
        branch::submit(core, async move {
            if delay_local_execution.load(Ordering::Acquire) {
                tokio::time::sleep(Duration::from_millis(options.local_execution_delay_ms)).await;
            }
            Self::run_locally(&spawn, &ctx, Some(stop_concurrent_spawns)).await
        })
    }

    /// Run the spawn on the first usable local strategy. Also serves as the
    /// non-dynamic fast path when `stop_concurrent_spawns` is `None`.
    pub async fn run_locally(
        spawn: &Spawn,
        ctx: &ActionExecutionContext,
        stop_concurrent_spawns: Option<StopConcurrentSpawns>,
    ) -> ExecResult<Vec<SpawnResult>> {
        for strategy in ctx
            .registry()
            .get_dynamic_strategies(spawn, DynamicMode::Local)
        {
            if strategy.can_exec(spawn, ctx) || strategy.can_exec_with_legacy_fallback(spawn, ctx)
            {
                return strategy
                    .exec_maybe_remotely(spawn, ctx, stop_concurrent_spawns)
                    .await;
            }
        }
        panic!(
            "no usable local strategy for {} although local viability was established",
            spawn.mnemonic
        );
    }
}
