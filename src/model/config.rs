use serde::{Deserialize, Serialize};

use super::policy::Policy;

/// Default sync endpoint
pub const DEFAULT_API_URL: &str = "https://api.todoist.com/sync/v9/sync";

/// Configuration from labeltree.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// API token; the command line and `TODOIST_API_KEY` take precedence
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Seconds between the start of one sync cycle and the next
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,
    /// Commands per write request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            api_url: default_api_url(),
            delay_secs: default_delay_secs(),
            batch_size: default_batch_size(),
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_delay_secs() -> u64 {
    5
}

/// The sync API rejects requests much larger than this
fn default_batch_size() -> usize {
    100
}

/// A labeling rule, e.g. `{ policy = "serial", directive = "next_action -n" }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub policy: Policy,
    pub directive: String,
}
