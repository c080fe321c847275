//! The remote side of a dynamic execution.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::actions::{
    ActionExecutionContext, DynamicMode, Spawn, SpawnResult, StopConcurrentSpawns,
};
use crate::dynamic::branch::{self, BranchCore, BranchHandle};
use crate::error::ExecResult;

pub struct RemoteBranch;

impl RemoteBranch {
    /// Launch the remote branch task.
    pub(crate) fn submit(
        core: Arc<BranchCore>,
        spawn: Arc<Spawn>,
        ctx: Arc<ActionExecutionContext>,
        delay_local_execution: Arc<AtomicBool>,
        stop_concurrent_spawns: StopConcurrentSpawns,
    ) -> BranchHandle {
        branch::submit(core, async move {
            Self::run_remotely(
                &spawn,
                &ctx,
                Some(stop_concurrent_spawns),
                &delay_local_execution,
            )
            .await
        })
    }

    /// Run the spawn on the first usable remote strategy. Also serves as the
    /// non-dynamic fast path when `stop_concurrent_spawns` is `None`.
    ///
    /// The first remote completion flips `delay_local_execution` so that
    /// subsequent local attempts wait for a possible remote cache hit.
    pub async fn run_remotely(
        spawn: &Spawn,
        ctx: &ActionExecutionContext,
        stop_concurrent_spawns: Option<StopConcurrentSpawns>,
        delay_local_execution: &AtomicBool,
    ) -> ExecResult<Vec<SpawnResult>> {
        for strategy in ctx
            .registry()
            .get_dynamic_strategies(spawn, DynamicMode::Remote)
        {
            if strategy.can_exec(spawn, ctx) {
                let results = strategy
                    .exec_maybe_remotely(spawn, ctx, stop_concurrent_spawns)
                    .await?;
                delay_local_execution.store(true, Ordering::Release);
                return Ok(results);
            }
        }
        panic!(
            "no usable remote strategy for {} although remote viability was established",
            spawn.mnemonic
        );
    }
}
