use thiserror::Error;

/// Errors surfaced while waiting for the contents of a nested set that is
/// still being materialized from storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FlattenError {
    #[error("interrupted while waiting for nested set contents")]
    Interrupted,
    #[error("timed out waiting for nested set contents")]
    Timeout,
}
