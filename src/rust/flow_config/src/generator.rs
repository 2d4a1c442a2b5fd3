//! Settings for the synthetic NetFlow v5 load generator.

use serde::{Deserialize, Serialize};

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Total records per second across all workers
    pub flows_per_second: u32,

    /// Records per second one worker is responsible for. The worker count
    /// is `flows_per_second / flows_per_worker`, rounded up.
    pub flows_per_worker: u32,

    /// Records packed into each datagram
    pub records_per_message: u16,

    /// Subnet random source addresses are drawn from
    pub source_subnet: String,

    /// Subnet random destination addresses are drawn from
    pub destination_subnet: String,

    /// `random`, a range such as `1000-2000`, a list such as `80,443` or a
    /// single port.
    pub source_ports: String,

    /// Same syntax as `source_ports`.
    pub destination_ports: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            flows_per_second: 4000,
            flows_per_worker: 4000,
            records_per_message: 10,
            source_subnet: "10.0.0.0/16".to_string(),
            destination_subnet: "192.168.0.0/16".to_string(),
            source_ports: "random".to_string(),
            destination_ports: "random".to_string(),
        }
    }
}

impl GeneratorConfig {
    /// How many workers are needed to reach `flows_per_second`.
    pub fn worker_count(&self) -> u32 {
        self.flows_per_second.div_ceil(self.flows_per_worker).max(1)
    }

    /// Share of the rate handled by worker `index`.
    pub fn flows_for_worker(&self, index: u32) -> u32 {
        let already = index.saturating_mul(self.flows_per_worker);
        self.flows_per_second
            .saturating_sub(already)
            .min(self.flows_per_worker)
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.flows_per_worker == 0 {
            return Err("flows_per_worker must be greater than zero".to_string());
        }
        if self.records_per_message == 0 || self.records_per_message as usize > crate::NETFLOW5_MAX_RECORDS {
            return Err(format!(
                "records_per_message must be between 1 and {}",
                crate::NETFLOW5_MAX_RECORDS
            ));
        }
        Ok(())
    }
}
