use std::path::Path;

use crate::domain::ETH_HEADER_LEN;
use crate::error::ConfigError;

const DEFAULT_CONFIG_PATH: &str = "/etc/vnetwire.conf";
const DEFAULT_DEVICE_A: &str = "vnet0";
const DEFAULT_DEVICE_B: &str = "vnet1";
const DEFAULT_MTU: usize = 1500;
const DEFAULT_RING_CAPACITY: usize = 1000;
const DEFAULT_HOOK_PREFIX: &str = "vnet";
const DEFAULT_LOG_FILTER: &str = "info";

/// Smallest MTU an IPv4 interface may have.
const MIN_MTU: usize = 68;
/// Longest interface name the host accepts.
const MAX_NAME_LEN: usize = 15;

/// Runtime settings for the wire and the tap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub device_a: String,
    pub device_b: String,
    pub mtu: usize,
    pub ring_capacity: usize,
    /// 0 keeps every forwarded frame until teardown.
    pub capture_list_limit: usize,
    pub hook_prefix: String,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device_a: DEFAULT_DEVICE_A.to_string(),
            device_b: DEFAULT_DEVICE_B.to_string(),
            mtu: DEFAULT_MTU,
            ring_capacity: DEFAULT_RING_CAPACITY,
            capture_list_limit: 0,
            hook_prefix: DEFAULT_HOOK_PREFIX.to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    /// Load from the file named by `VNETWIRE_CONFIG`, then apply
    /// `VNETWIRE_*` environment overrides.
    ///
    /// A missing file is not an error; defaults are used.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = std::env::var("VNETWIRE_CONFIG")
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let mut config = if Path::new(&config_path).exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::parse(&content)?
        } else {
            Self::default()
        };

        config.apply_env()?;
        Ok(config)
    }

    /// Parse `key = value` lines. `#` starts a comment line; unknown keys
    /// are ignored.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                config.set(key.trim(), value.trim())?;
            }
        }

        Ok(config)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        for key in [
            "device_a",
            "device_b",
            "mtu",
            "ring_capacity",
            "capture_list_limit",
            "hook_prefix",
            "log_filter",
        ] {
            let var = format!("VNETWIRE_{}", key.to_ascii_uppercase());
            if let Ok(val) = std::env::var(&var) {
                self.set(key, val.trim())?;
            }
        }
        Ok(())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "device_a" => self.device_a = value.to_string(),
            "device_b" => self.device_b = value.to_string(),
            "mtu" => self.mtu = parse_number(key, value)?,
            "ring_capacity" => self.ring_capacity = parse_number(key, value)?,
            "capture_list_limit" => self.capture_list_limit = parse_number(key, value)?,
            "hook_prefix" => self.hook_prefix = value.to_string(),
            "log_filter" => self.log_filter = value.to_string(),
            _ => {}
        }
        Ok(())
    }

    /// Check the settings the wire and the tap depend on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, name) in [("device_a", &self.device_a), ("device_b", &self.device_b)] {
            if name.is_empty() || name.len() > MAX_NAME_LEN {
                return Err(invalid(key, name));
            }
        }
        if self.device_a == self.device_b {
            return Err(invalid("device_b", &self.device_b));
        }
        if self.ring_capacity == 0 {
            return Err(invalid("ring_capacity", "0"));
        }
        if self.mtu < MIN_MTU {
            return Err(invalid("mtu", &self.mtu.to_string()));
        }
        Ok(())
    }

    /// Largest frame an endpoint accepts: MTU plus the Ethernet header.
    pub fn max_frame_len(&self) -> usize {
        self.mtu + ETH_HEADER_LEN
    }
}

fn parse_number(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse().map_err(|_| invalid(key, value))
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
    }
}
