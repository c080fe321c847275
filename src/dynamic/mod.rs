//! Dynamic spawn execution: race an action on the local and remote
//! back-ends and return whichever result commits first, cancelling and
//! fully tearing down the loser before returning.

pub mod arbiter;
pub mod branch;
pub mod local;
pub mod remote;
pub mod strategy;

pub use branch::BranchState;
pub use local::LocalBranch;
pub use remote::RemoteBranch;
pub use strategy::DynamicSpawnStrategy;
