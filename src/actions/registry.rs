//! Strategy interfaces the dynamic scheduler dispatches through.

use async_trait::async_trait;
use futures::future::BoxFuture;
use std::sync::Arc;

use crate::actions::context::ActionExecutionContext;
use crate::actions::policy::DynamicMode;
use crate::actions::spawn::{Spawn, SpawnResult};
use crate::error::ExecResult;

/// Callback a strategy invokes once its result is committed, asking the
/// arbiter to stop the concurrent peer branch. A strategy may call it at
/// most once; an `Err` means this branch lost the race and must abandon
/// its result by propagating the error.
pub type StopConcurrentSpawns =
    Arc<dyn Fn() -> BoxFuture<'static, ExecResult<()>> + Send + Sync>;

/// One back-end execution strategy. Implementations run the spawn in a
/// sandbox of their own and cooperate with dynamic scheduling through the
/// stop-concurrent-spawns callback.
#[async_trait]
pub trait SandboxedStrategy: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Whether this strategy can run the given spawn.
    fn can_exec(&self, spawn: &Spawn, ctx: &ActionExecutionContext) -> bool;

    /// Fallback check for strategies registered through the legacy flag;
    /// consulted for the local side only.
    fn can_exec_with_legacy_fallback(
        &self,
        _spawn: &Spawn,
        _ctx: &ActionExecutionContext,
    ) -> bool {
        false
    }

    /// Execute the spawn. When `stop_concurrent_spawns` is present, the
    /// strategy must invoke it after its result is committed and before
    /// returning.
    async fn exec_maybe_remotely(
        &self,
        spawn: &Spawn,
        ctx: &ActionExecutionContext,
        stop_concurrent_spawns: Option<StopConcurrentSpawns>,
    ) -> ExecResult<Vec<SpawnResult>>;
}

/// Registry of the strategies participating in dynamic execution, keyed by
/// back-end family.
pub trait DynamicStrategyRegistry: Send + Sync {
    fn get_dynamic_strategies(
        &self,
        spawn: &Spawn,
        mode: DynamicMode,
    ) -> Vec<Arc<dyn SandboxedStrategy>>;

    /// Invoked once when a build actually uses the dynamic strategy.
    fn notify_used_dynamic(&self);
}
