pub mod actions;
pub mod config;
pub mod dynamic;
pub mod error;
pub mod nested;

pub use crate::actions::{
    execution_requirements,
    ActionExecutionContext,
    DynamicMode,
    DynamicStrategyRegistry,
    EventEmitter,
    ExecutionEvent,
    ExecutionPolicy,
    SandboxedStrategy,
    Spawn,
    SpawnResult,
    SpawnStatus,
    StopConcurrentSpawns,
};
pub use crate::config::DynamicExecutionOptions;
pub use crate::dynamic::{BranchState, DynamicSpawnStrategy, LocalBranch, RemoteBranch};
pub use crate::error::{
    exit_code,
    DynamicExecutionCode,
    ExecError,
    ExecResult,
    FailureDetail,
    FlattenError,
};
pub use crate::nested::{
    ChildrenPromise,
    InterruptStrategy,
    NestedSet,
    NestedSetBuilder,
    Node,
    Order,
};
