//! Top-level configuration file for the flow exporter.

use crate::{CaptureConfig, ExporterConfig, GeneratorConfig, IpfixConfig, TimeoutConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};

/// Where the configuration lives unless told otherwise.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/flowd.conf";

/// Environment variable overriding [`DEFAULT_CONFIG_PATH`].
pub const CONFIG_ENV_VAR: &str = "FLOWD_CONFIG";

/// Top-level configuration file. Every section is optional and falls
/// back to its defaults.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// Collector, wire format and message limits
    pub exporter: ExporterConfig,

    /// Flow aging and template cadence
    pub timeouts: TimeoutConfig,

    /// Packet event source
    pub capture: CaptureConfig,

    /// IPFIX template definition
    pub ipfix: IpfixConfig,

    /// Synthetic load generator
    pub generator: GeneratorConfig,
}

impl Config {
    /// Test if a configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        self.exporter.validate()?;
        self.timeouts.validate()?;
        if self.capture.channel_capacity == 0 {
            return Err("capture channel_capacity must be greater than zero".to_string());
        }
        if self.exporter.protocol == crate::ExportProtocol::Ipfix {
            self.ipfix.validate()?;
        }
        self.generator.validate()?;
        Ok(())
    }

    /// Parses and validates a configuration held in a string.
    pub fn load_from_string(raw: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(raw).map_err(|e| {
            error!("Unable to parse configuration TOML");
            error!("Full error: {:?}", e);
            ConfigError::CannotParseToml(e.to_string())
        })?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Loads and validates the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            error!("{} does not exist!", path.display());
            return Err(ConfigError::ConfigDoesNotExist(path.display().to_string()));
        }
        let raw = std::fs::read_to_string(path).map_err(|e| {
            error!("Unable to read contents of {}: {e:?}", path.display());
            ConfigError::CannotReadFile(path.display().to_string())
        })?;
        let config = Self::load_from_string(&raw)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}

/// Loads the configuration from `$FLOWD_CONFIG`, or `/etc/flowd.conf`
/// when the variable is unset.
pub fn load_config() -> Result<Config, ConfigError> {
    let path = std::env::var(CONFIG_ENV_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    Config::load(Path::new(&path))
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} not found. You must create a configuration file to run the exporter.")]
    ConfigDoesNotExist(String),
    #[error("Unable to read contents of {0}.")]
    CannotReadFile(String),
    #[error("Unable to parse configuration TOML: {0}")]
    CannotParseToml(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod test {
    use super::{Config, ConfigError};
    use crate::{EvictionPolicy, ExportProtocol, StandardField};

    #[test]
    fn load_example() {
        let config = Config::load_from_string(include_str!("example.toml"))
            .expect("Cannot read example toml file");
        assert_eq!(config.exporter.protocol, ExportProtocol::Ipfix);
        assert_eq!(config.exporter.collector_port, 4739);
        assert_eq!(config.timeouts.eviction_policy, EvictionPolicy::Idle);
        assert_eq!(config.ipfix.enterprise.http_host.length, 64);
        assert_eq!(config.ipfix.fields[0], StandardField::SourceIpv4Address);
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::load_from_string("").expect("Empty config should be valid");
        assert_eq!(config, Config::default());
        assert_eq!(config.exporter.protocol, ExportProtocol::Netflow5);
        assert_eq!(config.timeouts.eviction_policy, EvictionPolicy::DrainAll);
    }

    #[test]
    fn reject_too_many_v5_records() {
        let raw = "[exporter]\nprotocol = \"netflow5\"\nmax_records_per_message = 31\n";
        assert!(matches!(
            Config::load_from_string(raw),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn reject_low_template_id() {
        let raw = "[exporter]\nprotocol = \"ipfix\"\n[ipfix]\ntemplate_id = 2\n";
        assert!(matches!(
            Config::load_from_string(raw),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn reject_enterprise_bit_in_id() {
        let raw = "[exporter]\nprotocol = \"ipfix\"\n[ipfix.enterprise.http_url]\nid = 32868\nlength = 10\n";
        assert!(matches!(
            Config::load_from_string(raw),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn reject_repeated_fields() {
        let raw = "[exporter]\nprotocol = \"ipfix\"\n[ipfix]\nfields = [\"protocol_identifier\", \"source_transport_port\", \"protocol_identifier\"]\n";
        assert!(matches!(
            Config::load_from_string(raw),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn reject_bad_collector() {
        let raw = "[exporter]\ncollector_ip = \"not-an-ip\"\n";
        assert!(Config::load_from_string(raw).is_err());
    }

    #[test]
    fn reject_garbage() {
        assert!(matches!(
            Config::load_from_string("this is [ not toml"),
            Err(ConfigError::CannotParseToml(_))
        ));
    }

    #[test]
    fn serialize_round_trip() {
        let config = Config::load_from_string(include_str!("example.toml")).unwrap();
        let serialized = toml::to_string_pretty(&config).expect("Cannot serialize config");
        let reloaded = Config::load_from_string(&serialized).unwrap();
        assert_eq!(config, reloaded);
    }
}
