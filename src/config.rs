//! Configuration for the dynamic scheduler.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Options governing dynamic execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DynamicExecutionOptions {
    /// How long a local branch waits before starting once a remote execution
    /// has been observed to complete, in milliseconds.
    pub local_execution_delay_ms: u64,
    /// Emit informational events describing scheduler decisions.
    #[serde(default)]
    pub debug_spawn_scheduler: bool,
    /// Fail spawns that carry a platform requirement without the matching
    /// requirements-set marker.
    #[serde(default)]
    pub require_availability_info: bool,
    /// Mnemonics exempt from the availability check.
    #[serde(default)]
    pub availability_info_exempt: HashSet<String>,
    /// Run everything remotely during the first build after server startup.
    #[serde(default)]
    pub skip_first_build: bool,
}

impl Default for DynamicExecutionOptions {
    fn default() -> Self {
        DynamicExecutionOptions {
            local_execution_delay_ms: 1000,
            debug_spawn_scheduler: false,
            require_availability_info: false,
            availability_info_exempt: HashSet::new(),
            skip_first_build: false,
        }
    }
}
