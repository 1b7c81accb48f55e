//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use bracket_engine::Limits;
use bracket_engine::bracket::DEFAULT_INBOX_SIZE;
use std::net::SocketAddr;

/// Default HTTP bind address
pub const DEFAULT_BIND: &str = "127.0.0.1:6969";

/// Upper bound accepted for `BRACKET_MAX_PARTICIPANTS`
const PARTICIPANT_CEILING: usize = 65_536;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Prometheus exporter address; metrics are disabled when unset
    pub metrics_bind: Option<SocketAddr>,
    /// Generation limits handed to the engine
    pub limits: Limits,
    /// Capacity of each bracket actor's inbox
    pub actor_inbox: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if a variable is present but cannot be parsed
    pub fn from_env(bind_override: Option<SocketAddr>) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_env_strict("BRACKET_SERVER_BIND", DEFAULT_BIND)?,
        };

        let metrics_bind = match std::env::var("BRACKET_METRICS_BIND") {
            Ok(value) if !value.trim().is_empty() => {
                Some(value.trim().parse().map_err(|_| ConfigError::Invalid {
                    var: "BRACKET_METRICS_BIND".to_string(),
                    reason: format!("'{value}' is not a socket address"),
                })?)
            }
            _ => None,
        };

        let defaults = Limits::default();
        let limits = Limits {
            max_participants: parse_env_or("BRACKET_MAX_PARTICIPANTS", defaults.max_participants),
            max_swiss_rounds: parse_env_or("BRACKET_MAX_SWISS_ROUNDS", defaults.max_swiss_rounds),
        };

        let actor_inbox = parse_env_or("BRACKET_ACTOR_INBOX", DEFAULT_INBOX_SIZE);

        Ok(ServerConfig {
            bind,
            metrics_bind,
            limits,
            actor_inbox,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.max_participants < 2 {
            return Err(ConfigError::Invalid {
                var: "BRACKET_MAX_PARTICIPANTS".to_string(),
                reason: "Must be at least 2".to_string(),
            });
        }

        if self.limits.max_participants > PARTICIPANT_CEILING {
            return Err(ConfigError::Invalid {
                var: "BRACKET_MAX_PARTICIPANTS".to_string(),
                reason: format!("Must be at most {PARTICIPANT_CEILING}"),
            });
        }

        if self.limits.max_swiss_rounds == 0 {
            return Err(ConfigError::Invalid {
                var: "BRACKET_MAX_SWISS_ROUNDS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.actor_inbox == 0 {
            return Err(ConfigError::Invalid {
                var: "BRACKET_ACTOR_INBOX".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.metrics_bind == Some(self.bind) {
            return Err(ConfigError::Invalid {
                var: "BRACKET_METRICS_BIND".to_string(),
                reason: format!("Must differ from the server bind address ({})", self.bind),
            });
        }

        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: ([127, 0, 0, 1], 6969).into(),
            metrics_bind: None,
            limits: Limits::default(),
            actor_inbox: DEFAULT_INBOX_SIZE,
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Parse a variable that must be well-formed when set
fn parse_env_strict<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    let raw = std::env::var(key).unwrap_or_else(|_| default.to_string());
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        var: key.to_string(),
        reason: format!("'{raw}' could not be parsed"),
    })
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 5] = [
        "BRACKET_SERVER_BIND",
        "BRACKET_METRICS_BIND",
        "BRACKET_MAX_PARTICIPANTS",
        "BRACKET_MAX_SWISS_ROUNDS",
        "BRACKET_ACTOR_INBOX",
    ];

    fn clear_env() {
        for var in VARS {
            // SAFETY: tests touching the environment run serially
            unsafe { std::env::remove_var(var) };
        }
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Invalid {
            var: "BRACKET_SERVER_BIND".to_string(),
            reason: "Use host:port".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("BRACKET_SERVER_BIND"));
        assert!(msg.contains("Use host:port"));
    }

    #[test]
    #[serial]
    fn test_defaults_without_env() {
        clear_env();
        let config = ServerConfig::from_env(None).unwrap();
        assert_eq!(config.bind, DEFAULT_BIND.parse().unwrap());
        assert_eq!(config.metrics_bind, None);
        assert_eq!(config.limits, Limits::default());
        assert_eq!(config.actor_inbox, DEFAULT_INBOX_SIZE);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        unsafe {
            std::env::set_var("BRACKET_SERVER_BIND", "0.0.0.0:8080");
            std::env::set_var("BRACKET_METRICS_BIND", "0.0.0.0:9090");
            std::env::set_var("BRACKET_MAX_PARTICIPANTS", "256");
            std::env::set_var("BRACKET_MAX_SWISS_ROUNDS", "9");
            std::env::set_var("BRACKET_ACTOR_INBOX", "16");
        }

        let config = ServerConfig::from_env(None).unwrap();
        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.metrics_bind.map(|addr| addr.port()), Some(9090));
        assert_eq!(config.limits.max_participants, 256);
        assert_eq!(config.limits.max_swiss_rounds, 9);
        assert_eq!(config.actor_inbox, 16);

        let overridden = ServerConfig::from_env(Some("127.0.0.1:7000".parse().unwrap())).unwrap();
        assert_eq!(overridden.bind.port(), 7000);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_malformed_bind_is_rejected() {
        clear_env();
        unsafe { std::env::set_var("BRACKET_SERVER_BIND", "not-an-address") };
        let err = ServerConfig::from_env(None).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "BRACKET_SERVER_BIND"));
        clear_env();
    }

    #[test]
    fn test_validation_rejects_tiny_limit() {
        let config = ServerConfig {
            limits: Limits {
                max_participants: 1, // Invalid
                ..Limits::default()
            },
            ..ServerConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_validation_rejects_shared_port() {
        let config = ServerConfig {
            metrics_bind: Some(ServerConfig::default().bind),
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
