use serde::{Deserialize, Serialize};

/// Fallback when a module declares no memory: the 20 pages the game host
/// has always allocated.
pub const DEFAULT_MEMORY_PAGES: u32 = 20;
pub const DEFAULT_MAX_CALL_DEPTH: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Overrides the module's declared initial memory size.
    pub memory_pages: Option<u32>,
    pub max_call_depth: usize,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self { memory_pages: None, max_call_depth: DEFAULT_MAX_CALL_DEPTH }
    }
}

impl MachineConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn memory_pages_for(&self, declared: Option<u32>) -> u32 {
        self.memory_pages.or(declared).unwrap_or(DEFAULT_MEMORY_PAGES)
    }
}
