//! Error types for the execution core.
//!
//! - [`ExecError`] — Errors raised while scheduling and running spawns.
//! - [`FlattenError`] — Errors raised while flattening a nested set whose
//!   contents are still being materialized.
//! - [`FailureDetail`] — Structured failure metadata (message plus a code
//!   from the closed dynamic-execution set).

pub mod exec_error;
pub mod failure_detail;
pub mod flatten_error;

pub use exec_error::ExecError;
pub use failure_detail::{exit_code, DynamicExecutionCode, FailureDetail};
pub use flatten_error::FlattenError;

/// Convenience alias for spawn-execution results.
pub type ExecResult<T> = Result<T, ExecError>;
