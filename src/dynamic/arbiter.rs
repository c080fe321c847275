//! Arbitration between the two branches of a dynamic execution.
//!
//! Exactly one branch is allowed to publish a result. The first branch whose
//! result commits claims the arbitration cell, cancels its peer, and then
//! blocks on the peer's done latch so that the strategy never returns while
//! the loser is still writing outputs or holding subprocess handles.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::actions::{ActionExecutionContext, DynamicMode, Spawn, SpawnResult};
use crate::config::DynamicExecutionOptions;
use crate::dynamic::branch::{BranchCore, BranchHandle};
use crate::error::{ExecError, ExecResult};

const NONE: u8 = 0;
const LOCAL: u8 = 1;
const REMOTE: u8 = 2;

/// Atomic record of which side won the race and is allowed to cancel its
/// peer. Set at most once per exec call.
pub(crate) struct StrategyThatCancelled {
    cell: AtomicU8,
}

impl StrategyThatCancelled {
    pub fn new() -> Self {
        StrategyThatCancelled {
            cell: AtomicU8::new(NONE),
        }
    }

    pub fn get(&self) -> Option<DynamicMode> {
        match self.cell.load(Ordering::Acquire) {
            LOCAL => Some(DynamicMode::Local),
            REMOTE => Some(DynamicMode::Remote),
            _ => None,
        }
    }

    /// Claim the cell for `mode`. Only the first claim succeeds.
    pub fn try_claim(&self, mode: DynamicMode) -> bool {
        let value = match mode {
            DynamicMode::Local => LOCAL,
            DynamicMode::Remote => REMOTE,
        };
        self.cell
            .compare_exchange(NONE, value, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Build the stop-concurrent-spawns callback for one branch: when its
/// strategy commits a result it calls back here to stop the peer.
pub(crate) fn stop_concurrent_spawns_callback(
    other_branch: Arc<BranchCore>,
    cancelling_branch: Arc<BranchCore>,
    strategy_that_cancelled: Arc<StrategyThatCancelled>,
    options: Arc<DynamicExecutionOptions>,
    ctx: Arc<ActionExecutionContext>,
) -> crate::actions::StopConcurrentSpawns {
    Arc::new(move || {
        let other_branch = other_branch.clone();
        let cancelling_branch = cancelling_branch.clone();
        let strategy_that_cancelled = strategy_that_cancelled.clone();
        let options = options.clone();
        let ctx = ctx.clone();
        Box::pin(async move {
            stop_branch(
                &other_branch,
                &cancelling_branch,
                &strategy_that_cancelled,
                &options,
                &ctx,
            )
            .await
        })
    })
}

/// Cancel and wait for the peer branch to terminate. Called by whichever
/// branch commits first; each branch may call this at most once.
pub(crate) async fn stop_branch(
    other_branch: &Arc<BranchCore>,
    cancelling_branch: &Arc<BranchCore>,
    strategy_that_cancelled: &StrategyThatCancelled,
    options: &DynamicExecutionOptions,
    ctx: &ActionExecutionContext,
) -> ExecResult<()> {
    let cancelling_strategy = cancelling_branch.mode();
    if cancelling_branch.is_cancelled() {
        // Can happen when the cancellation of this branch has not reached its
        // task yet; give up execution without guessing further.
        tracing::debug!(
            mode = %cancelling_strategy,
            spawn = %cancelling_branch.spawn().describe(),
            "stop_branch called by an already-cancelled branch"
        );
        return Err(ExecError::DynamicInterrupted(format!(
            "execution of {} strategy stopped because it was cancelled but not interrupted",
            cancelling_strategy
        )));
    }

    if strategy_that_cancelled.get() == Some(cancelling_strategy) {
        panic!("stop_branch called more than once by {}", cancelling_strategy);
    }

    if strategy_that_cancelled.try_claim(cancelling_strategy) {
        if options.debug_spawn_scheduler {
            ctx.event_emitter().info(format!(
                "{} action finished {}ly",
                cancelling_branch.spawn().mnemonic,
                cancelling_strategy
            ));
        }

        if !other_branch.cancel() && !other_branch.is_cancelled() {
            // The peer completed uncancellably; our own result is void.
            return Err(ExecError::DynamicInterrupted(format!(
                "execution of {} strategy stopped because {} strategy could not be cancelled",
                cancelling_strategy,
                cancelling_strategy.other()
            )));
        }
        other_branch.acquire_done().await;
        Ok(())
    } else {
        Err(ExecError::DynamicInterrupted(format!(
            "execution of {} strategy stopped because {} strategy finished first",
            cancelling_strategy,
            cancelling_strategy.other()
        )))
    }
}

/// Wait for both branches. The winner's result is returned; the loser must
/// have been converted to the cancelled sentinel. Anything else is a bug in
/// the cancellation protocol.
pub(crate) async fn wait_branches(
    mut local_branch: BranchHandle,
    mut remote_branch: BranchHandle,
    spawn: &Spawn,
    options: &DynamicExecutionOptions,
    ctx: &ActionExecutionContext,
) -> ExecResult<Vec<SpawnResult>> {
    let local_result = match wait_branch(&mut local_branch, options, ctx).await {
        Ok(result) => result,
        Err(e) => {
            if options.debug_spawn_scheduler {
                ctx.event_emitter().info(format!(
                    "cancelling remote branch of {} after local error: {}",
                    spawn.pretty_print(),
                    e
                ));
            }
            remote_branch.core().cancel();
            remote_branch.core().acquire_done().await;
            return Err(e);
        }
    };

    let remote_result = wait_branch(&mut remote_branch, options, ctx).await?;

    match (local_result, remote_result) {
        (Some(_), Some(_)) => panic!(
            "neither branch of {} cancelled the other one; local was {:?}, remote was {:?}",
            spawn.pretty_print(),
            local_branch.core().state(),
            remote_branch.core().state()
        ),
        (Some(local), None) => Ok(local),
        (None, Some(remote)) => Ok(remote),
        (None, None) => panic!(
            "neither branch of {} completed; local was {:?}, remote was {:?}",
            spawn.pretty_print(),
            local_branch.core().state(),
            remote_branch.core().state()
        ),
    }
}

/// Wait for a single branch. Returns its results, or `None` if the branch
/// was cancelled. A `DynamicInterrupted` failure means the peer won while
/// this branch was committing; it is folded into the cancelled sentinel
/// rather than propagated. A top-level interrupt cancels the branch and
/// propagates; the caller performs the done-latch handshake with the peer.
/// The latch is not acquired here because the peer's stop call may already
/// have consumed this branch's permit.
async fn wait_branch(
    branch: &mut BranchHandle,
    options: &DynamicExecutionOptions,
    ctx: &ActionExecutionContext,
) -> ExecResult<Option<Vec<SpawnResult>>> {
    let mode = branch.core().mode();
    let outcome = tokio::select! {
        _ = ctx.interrupt().cancelled() => {
            branch.core().cancel();
            return Err(ExecError::Interrupted);
        }
        outcome = branch.results() => outcome,
    };

    match outcome {
        Ok(Some(results)) => Ok(Some(results)),
        Ok(None) => {
            if options.debug_spawn_scheduler {
                ctx.event_emitter().info(format!(
                    "{} branch of {} was cancelled",
                    mode,
                    branch.core().spawn().pretty_print()
                ));
            }
            Ok(None)
        }
        Err(ExecError::DynamicInterrupted(message)) => {
            if options.debug_spawn_scheduler {
                ctx.event_emitter().info(format!(
                    "{} branch of {} gave up: {}",
                    mode,
                    branch.core().spawn().pretty_print(),
                    message
                ));
            }
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
