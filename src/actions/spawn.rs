//! Action descriptors consumed by the dynamic scheduler.

use std::collections::HashMap;

/// Execution-info keys the scheduler inspects.
pub mod execution_requirements {
    /// Marks a spawn that must run on a Darwin host.
    pub const REQUIRES_DARWIN: &str = "requires-darwin";
    /// Marks a spawn whose platform requirements have been fully resolved.
    pub const REQUIREMENTS_SET: &str = "requirements-set";
}

/// An action to be executed: the scheduler only reads identity and
/// requirement metadata, the command line itself is opaque to it.
#[derive(Debug, Clone)]
pub struct Spawn {
    pub mnemonic: String,
    pub execution_info: HashMap<String, String>,
    pub execution_platform: Option<String>,
    pub tool_files: Vec<String>,
    pub primary_output: String,
    pub owner_label: String,
}

impl Spawn {
    pub fn new(mnemonic: impl Into<String>, owner_label: impl Into<String>) -> Self {
        Spawn {
            mnemonic: mnemonic.into(),
            execution_info: HashMap::new(),
            execution_platform: None,
            tool_files: Vec::new(),
            primary_output: String::new(),
            owner_label: owner_label.into(),
        }
    }

    pub fn with_execution_info(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.execution_info.insert(key.into(), value.into());
        self
    }

    pub fn with_execution_platform(mut self, platform: impl Into<String>) -> Self {
        self.execution_platform = Some(platform.into());
        self
    }

    pub fn with_tool_files(mut self, tool_files: Vec<String>) -> Self {
        self.tool_files = tool_files;
        self
    }

    pub fn with_primary_output(mut self, primary_output: impl Into<String>) -> Self {
        self.primary_output = primary_output.into();
        self
    }

    /// Short identity used in log lines.
    pub fn describe(&self) -> String {
        format!("{} for {}", self.mnemonic, self.owner_label)
    }

    /// Identity used in user-facing events; names the primary output when
    /// one is known.
    pub fn pretty_print(&self) -> String {
        if self.primary_output.is_empty() {
            self.describe()
        } else {
            format!("{} {}", self.mnemonic, self.primary_output)
        }
    }
}

/// Terminal status of one spawn execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnStatus {
    Success,
    NonZeroExit,
}

/// Outcome of running a spawn on one back-end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnResult {
    pub status: SpawnStatus,
    pub exit_code: i32,
    pub runner_name: String,
}

impl SpawnResult {
    pub fn success(runner_name: impl Into<String>) -> Self {
        SpawnResult {
            status: SpawnStatus::Success,
            exit_code: 0,
            runner_name: runner_name.into(),
        }
    }

    pub fn failure(exit_code: i32, runner_name: impl Into<String>) -> Self {
        SpawnResult {
            status: SpawnStatus::NonZeroExit,
            exit_code,
            runner_name: runner_name.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == SpawnStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_describe() {
        let spawn = Spawn::new("CppCompile", "//pkg:lib");
        assert_eq!(spawn.describe(), "CppCompile for //pkg:lib");
        assert_eq!(spawn.pretty_print(), "CppCompile for //pkg:lib");

        let spawn = spawn.with_primary_output("bazel-out/pkg/lib.o");
        assert_eq!(spawn.pretty_print(), "CppCompile bazel-out/pkg/lib.o");
    }

    #[test]
    fn test_spawn_execution_info() {
        let spawn = Spawn::new("ObjcCompile", "//app:app")
            .with_execution_info(execution_requirements::REQUIRES_DARWIN, "1")
            .with_execution_platform("darwin_x86_64");
        assert!(spawn
            .execution_info
            .contains_key(execution_requirements::REQUIRES_DARWIN));
        assert_eq!(spawn.execution_platform.as_deref(), Some("darwin_x86_64"));
    }

    #[test]
    fn test_spawn_result() {
        assert!(SpawnResult::success("worker").is_success());
        let failed = SpawnResult::failure(3, "worker");
        assert!(!failed.is_success());
        assert_eq!(failed.exit_code, 3);
    }
}
