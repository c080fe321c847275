use serde::{Deserialize, Serialize};

/// Closed set of failure codes reported by the dynamic scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DynamicExecutionCode {
    XcodeRelatedPrereqUnmet,
    NoUsableStrategyFound,
}

/// Structured failure report carried by user and environmental errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDetail {
    pub message: String,
    pub code: DynamicExecutionCode,
}

impl FailureDetail {
    pub fn new(message: impl Into<String>, code: DynamicExecutionCode) -> Self {
        FailureDetail {
            message: message.into(),
            code,
        }
    }
}

/// Process exit codes used by non-recoverable paths.
pub mod exit_code {
    /// Used when a non-interruptible flatten is interrupted while waiting
    /// for set contents.
    pub const INTERRUPTED: i32 = 8;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_detail_serde() {
        let detail = FailureDetail::new("no strategy", DynamicExecutionCode::NoUsableStrategyFound);
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["message"], "no strategy");
        assert_eq!(json["code"], "NO_USABLE_STRATEGY_FOUND");

        let back: FailureDetail = serde_json::from_value(json).unwrap();
        assert_eq!(back, detail);
    }

    #[test]
    fn test_code_rename() {
        let json =
            serde_json::to_value(DynamicExecutionCode::XcodeRelatedPrereqUnmet).unwrap();
        assert_eq!(json, "XCODE_RELATED_PREREQ_UNMET");
    }
}
