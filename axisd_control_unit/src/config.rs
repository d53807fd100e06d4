//! TOML configuration of the `axisd` node.
//!
//! Every table and field is optional; an empty file yields a TCP-only
//! simulation node on port 6666.
//!
//! ```toml
//! [shared]
//! log_level = "info"
//! service_name = "axisd"
//!
//! [server]
//! port = 6666
//! transport = "threaded"      # or "reactor"
//! status_mode = "full"        # or "delta"
//!
//! [motion]
//! profile = "minimum_jerk"    # parabolic | minimum_jerk | energy_optimal
//!
//! [shm]
//! enabled = true
//! name = "/axisd_status"
//!
//! [companion]
//! enabled = false
//! handshake_timeout_ms = 50
//!
//! [hal]
//! driver = "simulation"
//! ```

use crate::control::profile::{DEFAULT_IN_POSITION_WINDOW, DEFAULT_ZERO_RATE_FLOOR, ProfileFamily};
use crate::protocol::codec::HEADER_LEN;
use crate::protocol::status::{DEFAULT_DELTA_REFRESH_INTERVAL, PublishMode};
use axisd_common::config::{ConfigError, ConfigLoader, SharedConfig};
use axisd_common::consts::{DEFAULT_PORT, DEFAULT_SHM_NAME};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

// ─── Server ─────────────────────────────────────────────────────────

/// Connection handling model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// One thread per client plus an idle scan thread.
    #[default]
    Threaded,
    /// Single-threaded mio event loop.
    Reactor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: IpAddr,
    pub port: u16,
    pub transport: Transport,
    pub max_clients: usize,
    pub read_timeout_ms: u64,
    pub write_timeout_ms: u64,
    /// Scan cadence while no client is sending.
    pub idle_tick_us: u64,
    pub recv_buffer_size: usize,
    pub status_mode: PublishMode,
    pub delta_refresh_interval: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            transport: Transport::default(),
            max_clients: 8,
            read_timeout_ms: 3000,
            write_timeout_ms: 3000,
            idle_tick_us: 1000,
            recv_buffer_size: 4096,
            status_mode: PublishMode::default(),
            delta_refresh_interval: DEFAULT_DELTA_REFRESH_INTERVAL,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    pub fn idle_tick(&self) -> Duration {
        Duration::from_micros(self.idle_tick_us)
    }
}

// ─── Motion ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    pub profile: ProfileFamily,
    /// Substitute for a velocity/acceleration/jerk of exactly zero.
    pub zero_rate_floor: f64,
    pub in_position_window: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            profile: ProfileFamily::default(),
            zero_rate_floor: DEFAULT_ZERO_RATE_FLOOR,
            in_position_window: DEFAULT_IN_POSITION_WINDOW,
        }
    }
}

// ─── Shared region / companion / driver ─────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShmConfig {
    pub enabled: bool,
    pub name: String,
}

impl Default for ShmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            name: DEFAULT_SHM_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanionConfig {
    pub enabled: bool,
    /// Registry name of the companion task.
    pub name: String,
    pub handshake_timeout_ms: u64,
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            name: "simulation".to_string(),
            handshake_timeout_ms: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HalConfig {
    /// Registry name of the axis driver.
    pub driver: String,
}

impl Default for HalConfig {
    fn default() -> Self {
        Self {
            driver: "simulation".to_string(),
        }
    }
}

// ─── Node ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub shared: SharedConfig,
    pub server: ServerConfig,
    pub motion: MotionConfig,
    pub shm: ShmConfig,
    pub companion: CompanionConfig,
    pub hal: HalConfig,
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}

impl NodeConfig {
    /// # Errors
    /// `ConfigError::ValidationError` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        let server = &self.server;
        if server.max_clients == 0 {
            return Err(invalid("server.max_clients must be at least 1"));
        }
        if server.read_timeout_ms == 0 || server.write_timeout_ms == 0 {
            return Err(invalid("server read/write timeouts must be nonzero"));
        }
        if server.idle_tick_us == 0 {
            return Err(invalid("server.idle_tick_us must be nonzero"));
        }
        if server.recv_buffer_size < HEADER_LEN {
            return Err(invalid(format!(
                "server.recv_buffer_size must hold a frame header ({HEADER_LEN} bytes)"
            )));
        }
        if server.delta_refresh_interval == 0 {
            return Err(invalid("server.delta_refresh_interval must be nonzero"));
        }

        let motion = &self.motion;
        if !motion.zero_rate_floor.is_finite() || motion.zero_rate_floor <= 0.0 {
            return Err(invalid("motion.zero_rate_floor must be positive"));
        }
        if !motion.in_position_window.is_finite() || motion.in_position_window < 0.0 {
            return Err(invalid("motion.in_position_window must not be negative"));
        }

        if self.shm.enabled && !self.shm.name.starts_with('/') {
            return Err(invalid(format!(
                "shm.name '{}' must start with '/'",
                self.shm.name
            )));
        }
        if self.companion.enabled {
            if !self.shm.enabled {
                return Err(invalid("companion requires the shared region"));
            }
            if self.companion.handshake_timeout_ms == 0 {
                return Err(invalid("companion.handshake_timeout_ms must be nonzero"));
            }
        }
        if self.hal.driver.is_empty() {
            return Err(invalid("hal.driver cannot be empty"));
        }
        Ok(())
    }
}

/// Load and validate the node configuration.
pub fn load_config(path: &Path) -> Result<NodeConfig, ConfigError> {
    let config = NodeConfig::load(path)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = NodeConfig::from_toml("").unwrap();
        assert_eq!(config.server.port, 6666);
        assert_eq!(config.server.transport, Transport::Threaded);
        assert_eq!(config.server.status_mode, PublishMode::Full);
        assert_eq!(config.server.delta_refresh_interval, 200);
        assert_eq!(config.motion.profile, ProfileFamily::Parabolic);
        assert_eq!(config.motion.zero_rate_floor, 10.0);
        assert!(config.shm.enabled);
        assert!(!config.companion.enabled);
        assert_eq!(config.hal.driver, "simulation");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let config = NodeConfig::from_toml(
            r#"
            [server]
            port = 7000
            transport = "reactor"
            status_mode = "delta"

            [motion]
            profile = "energy_optimal"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.server.transport, Transport::Reactor);
        assert_eq!(config.server.status_mode, PublishMode::Delta);
        assert_eq!(config.server.max_clients, 8);
        assert_eq!(config.motion.profile, ProfileFamily::EnergyOptimal);
        assert_eq!(config.motion.in_position_window, 1.0);
    }

    #[test]
    fn unknown_profile_is_a_parse_error() {
        let err = NodeConfig::from_toml("[motion]\nprofile = \"cubic\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn validation_catches_bad_values() {
        let mut config = NodeConfig::default();
        config.shm.name = "axisd".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));

        let mut config = NodeConfig::default();
        config.companion.enabled = true;
        config.shm.enabled = false;
        assert!(config.validate().is_err());

        let mut config = NodeConfig::default();
        config.motion.zero_rate_floor = 0.0;
        assert!(config.validate().is_err());

        let mut config = NodeConfig::default();
        config.server.recv_buffer_size = 4;
        assert!(config.validate().is_err());
    }
}
