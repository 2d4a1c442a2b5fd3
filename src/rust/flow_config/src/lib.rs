//! Configuration for the flow exporter (`flowd`) and the synthetic
//! load generator (`flowgen`).
//!
//! The configuration lives in `/etc/flowd.conf` (TOML). Set the
//! `FLOWD_CONFIG` environment variable to read it from elsewhere.

mod capture;
mod config;
mod exporter;
mod generator;
mod ipfix;
mod timeouts;

pub use capture::CaptureConfig;
pub use config::{load_config, Config, ConfigError, CONFIG_ENV_VAR, DEFAULT_CONFIG_PATH};
pub use exporter::{ExportProtocol, ExporterConfig, MAX_SAFE_PAYLOAD, NETFLOW5_MAX_RECORDS};
pub use generator::GeneratorConfig;
pub use ipfix::{EnterpriseConfig, EnterpriseFieldConfig, IpfixConfig, StandardField};
pub use timeouts::{EvictionPolicy, TimeoutConfig};
