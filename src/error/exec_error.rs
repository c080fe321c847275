//! Spawn-execution error taxonomy.

use serde_json::json;
use thiserror::Error;

use super::failure_detail::FailureDetail;

/// Errors raised while scheduling and running spawns.
///
/// Protocol violations in the dynamic scheduler (both branches publishing a
/// result, a branch issuing a second cancellation, and the like) are bugs and
/// panic with a descriptive message instead of appearing here.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The action cannot run on any back-end; surfaced to the user.
    #[error("{}", .0.message)]
    User(FailureDetail),
    /// The spawn violates availability preconditions of the host environment.
    #[error("{}", .0.message)]
    Environmental(FailureDetail),
    /// The underlying runner reported a failure.
    #[error("execution failed: {message}")]
    Execution {
        message: String,
        exit_code: Option<i32>,
    },
    /// Internal signal of the peer-cancel protocol: this branch lost the race
    /// and must abandon its result. Converted to the cancelled sentinel by
    /// the arbiter, never surfaced to callers.
    #[error("dynamic execution interrupted: {0}")]
    DynamicInterrupted(String),
    /// The top-level caller was interrupted while waiting for a branch.
    #[error("interrupted")]
    Interrupted,
}

impl ExecError {
    pub fn execution(message: impl Into<String>) -> Self {
        ExecError::Execution {
            message: message.into(),
            exit_code: None,
        }
    }

    /// The structured failure report, for user and environmental errors.
    pub fn failure_detail(&self) -> Option<&FailureDetail> {
        match self {
            ExecError::User(detail) | ExecError::Environmental(detail) => Some(detail),
            _ => None,
        }
    }

    /// Render this error as a structured JSON payload for event consumers.
    pub fn to_structured_json(&self) -> serde_json::Value {
        match self {
            ExecError::User(detail) | ExecError::Environmental(detail) => json!({
                "message": detail.message,
                "code": detail.code,
            }),
            ExecError::Execution { message, exit_code } => json!({
                "message": message,
                "exit_code": exit_code,
            }),
            other => json!({ "message": other.to_string() }),
        }
    }
}
