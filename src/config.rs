use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Identifies the client as a common desktop browser.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_CONCURRENT: usize = 8;

/// Settings for one `SiteMirror`. Every field has a default so a partial
/// JSON document is enough to build one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    pub user_agent: String,
    /// Applied both to connecting and to the whole request.
    pub timeout_secs: u64,
    /// Upper bound on asset fetches in flight.
    pub max_concurrent: usize,
    /// Write README.md, structure_prompt.txt and full_source_code.txt.
    pub write_report: bool,
}

impl MirrorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            write_report: true,
        }
    }
}
