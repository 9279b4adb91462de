//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Configuration for one acquisition run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Re-fetch units even when a complete artifact already exists.
    #[serde(default)]
    pub force: bool,

    /// Fetch timing for timing-capable audio filesets.
    #[serde(default = "default_fetch_timing")]
    pub fetch_timing: bool,
}

fn default_fetch_timing() -> bool {
    true
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            force: false,
            fetch_timing: default_fetch_timing(),
        }
    }
}

impl OrchestratorConfig {
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_fetch_timing(mut self, fetch_timing: bool) -> Self {
        self.fetch_timing = fetch_timing;
        self
    }
}
