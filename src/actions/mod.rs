//! Action descriptors and the interfaces the scheduler consumes.

pub mod context;
pub mod policy;
pub mod registry;
pub mod spawn;

pub use context::{ActionExecutionContext, EventEmitter, ExecutionEvent};
pub use policy::{DynamicMode, ExecutionPolicy};
pub use registry::{DynamicStrategyRegistry, SandboxedStrategy, StopConcurrentSpawns};
pub use spawn::{execution_requirements, Spawn, SpawnResult, SpawnStatus};
