use serde::{Deserialize, Serialize};

use crate::device::constants::DEFAULT_SCAN_TIMEOUT_SECS;

/// Persistent defaults for command flags; flags always win over these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub device_name: Option<String>,
    pub device_address: Option<String>,
    pub scan_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            device_name: None,
            device_address: None,
            scan_timeout_secs: DEFAULT_SCAN_TIMEOUT_SECS,
        }
    }
}
