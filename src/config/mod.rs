//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;

/// Application configuration loaded from environment variables.
/// Game rules are compile-time constants and do not live here.
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Allowed client origins for CORS, comma-separated. Unset allows any.
    pub client_origin: Option<String>,
    /// Seed for spawn points, bot identifiers and bot decisions
    pub arena_seed: Option<u64>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = match lookup("PORT") {
            Some(port) => format!("0.0.0.0:{}", port),
            None => lookup("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
        };

        let arena_seed = lookup("ARENA_SEED")
            .map(|seed| seed.parse::<u64>().map_err(|_| ConfigError::InvalidSeed))
            .transpose()?;

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            client_origin: lookup("CLIENT_ORIGIN").filter(|origin| !origin.trim().is_empty()),
            arena_seed,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid server address format")]
    InvalidAddress,

    #[error("ARENA_SEED must be an unsigned 64-bit integer")]
    InvalidSeed,
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.server_addr, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.log_level, "info");
        assert!(config.client_origin.is_none());
        assert!(config.arena_seed.is_none());
    }

    #[test]
    fn port_wins_over_server_addr() {
        let config = load(&[("PORT", "9000"), ("SERVER_ADDR", "127.0.0.1:1234")]).unwrap();
        assert_eq!(config.server_addr.port(), 9000);
    }

    #[test]
    fn bad_address_is_rejected() {
        let result = load(&[("SERVER_ADDR", "not-an-address")]);
        assert!(matches!(result, Err(ConfigError::InvalidAddress)));
    }

    #[test]
    fn seed_is_parsed() {
        assert_eq!(load(&[("ARENA_SEED", "42")]).unwrap().arena_seed, Some(42));
        assert!(matches!(
            load(&[("ARENA_SEED", "-1")]),
            Err(ConfigError::InvalidSeed)
        ));
    }

    #[test]
    fn blank_origin_counts_as_unset() {
        assert!(load(&[("CLIENT_ORIGIN", "  ")]).unwrap().client_origin.is_none());
    }
}
