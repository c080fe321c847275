//! Immutable, structurally shared DAG representations of ordered multisets,
//! used to propagate transitive information (for example compile inputs)
//! between build targets. Union is cheap; flattening is lazy, memoized, and
//! deterministic for a given order and construction history.

pub mod builder;
pub mod node;
pub mod order;
pub mod pending;

pub use builder::NestedSetBuilder;
pub use node::{NestedSet, Node};
pub use order::Order;
pub use pending::{ChildrenPromise, InterruptStrategy};
