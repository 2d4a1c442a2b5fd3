//! Flow aging and template cadence.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How flows leave the flow table at each export pass.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EvictionPolicy {
    /// Export every flow at the end of each active-timeout window and
    /// start from an empty table.
    #[default]
    DrainAll,
    /// Keep flows across windows; only export the ones that have been
    /// idle for longer than the inactive timeout.
    Idle,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Length of each collecting window, in seconds.
    pub active_timeout_seconds: u64,

    /// Idle time after which a flow is evicted (idle policy only).
    pub inactive_timeout_seconds: u64,

    /// How often the IPFIX template is re-announced.
    pub template_interval_seconds: u64,

    /// Which eviction policy this exporter uses.
    pub eviction_policy: EvictionPolicy,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            active_timeout_seconds: 60,
            inactive_timeout_seconds: 30,
            template_interval_seconds: 300,
            eviction_policy: EvictionPolicy::DrainAll,
        }
    }
}

impl TimeoutConfig {
    pub fn active_timeout(&self) -> Duration {
        Duration::from_secs(self.active_timeout_seconds)
    }

    pub fn inactive_timeout(&self) -> Duration {
        Duration::from_secs(self.inactive_timeout_seconds)
    }

    pub fn template_interval(&self) -> Duration {
        Duration::from_secs(self.template_interval_seconds)
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.active_timeout_seconds == 0 {
            return Err("active_timeout_seconds must be greater than zero".to_string());
        }
        if self.inactive_timeout_seconds == 0 {
            return Err("inactive_timeout_seconds must be greater than zero".to_string());
        }
        if self.template_interval_seconds == 0 {
            return Err("template_interval_seconds must be greater than zero".to_string());
        }
        Ok(())
    }
}
