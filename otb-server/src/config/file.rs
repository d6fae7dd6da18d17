//! TOML file configuration structures.
//!
//! These structs directly map to the `otb-config.toml` file format.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    pub messaging: MessagingConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

fn default_listen_addr() -> SocketAddr {
    "0.0.0.0:8080".parse().expect("valid default address")
}

/// Engine timing knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seconds between lifecycle sweep ticks.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Days a notification dedup record is kept before pruning.
    #[serde(default = "default_dedup_ttl_days")]
    pub dedup_ttl_days: i64,
    /// Seconds between liveness pings on push connections.
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,
}

fn default_sweep_interval_secs() -> u64 {
    5
}

fn default_dedup_ttl_days() -> i64 {
    30
}

fn default_ping_interval_secs() -> u64 {
    30
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval_secs(),
            dedup_ttl_days: default_dedup_ttl_days(),
            ping_interval_secs: default_ping_interval_secs(),
        }
    }
}

/// Messaging provider configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagingConfig {
    /// Base URL of the bot API (e.g., "https://bot.example.com/api").
    pub api_base: String,
    /// Bearer token for the bot API.
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parsing() {
        let toml_str = r#"
[server]
listen = "127.0.0.1:3000"

[engine]
sweep_interval_secs = 2
dedup_ttl_days = 7
ping_interval_secs = 15

[messaging]
api_base = "https://bot.example.com/api"
token = "bot-token"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen.port(), 3000);
        assert_eq!(config.engine.sweep_interval_secs, 2);
        assert_eq!(config.engine.dedup_ttl_days, 7);
        assert_eq!(config.messaging.api_base, "https://bot.example.com/api");
    }

    #[test]
    fn test_engine_section_defaults() {
        let toml_str = r#"
[server]
listen = "127.0.0.1:3000"

[messaging]
api_base = "https://bot.example.com/api"
token = "bot-token"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.engine.sweep_interval_secs, 5);
        assert_eq!(config.engine.dedup_ttl_days, 30);
        assert_eq!(config.engine.ping_interval_secs, 30);
    }
}
