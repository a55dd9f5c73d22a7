use crate::{ConfigError, FromEnv, env_or_default, env_parse};
use std::net::Ipv4Addr;
use std::time::Duration;

/// HTTP server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound for a single request, list queries included.
    pub request_timeout: Duration,
    /// Grace period for in-flight requests and connection cleanup on shutdown.
    pub shutdown_timeout: Duration,
}

impl ServerConfig {
    pub fn new(host: String, port: u16) -> Self {
        Self {
            host,
            port,
            ..Self::default()
        }
    }

    /// Get the server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl FromEnv for ServerConfig {
    /// Environment variables:
    /// - `HOST` (default `0.0.0.0`)
    /// - `PORT` (default `8080`)
    /// - `REQUEST_TIMEOUT_SECS` (default `30`)
    /// - `SHUTDOWN_TIMEOUT_SECS` (default `30`)
    fn from_env() -> Result<Self, ConfigError> {
        let host = env_or_default("HOST", &Ipv4Addr::UNSPECIFIED.to_string());
        let port = env_parse("PORT", "8080")?;
        let request_timeout = Duration::from_secs(env_parse("REQUEST_TIMEOUT_SECS", "30")?);
        let shutdown_timeout = Duration::from_secs(env_parse("SHUTDOWN_TIMEOUT_SECS", "30")?);

        Ok(Self {
            host,
            port,
            request_timeout,
            shutdown_timeout,
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Ipv4Addr::UNSPECIFIED.to_string(),
            port: 8080,
            request_timeout: Duration::from_secs(30),
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: [&str; 4] = ["HOST", "PORT", "REQUEST_TIMEOUT_SECS", "SHUTDOWN_TIMEOUT_SECS"];

    #[test]
    fn test_server_config_from_env_with_defaults() {
        temp_env::with_vars(VARS.map(|k| (k, None::<&str>)), || {
            let config = ServerConfig::from_env().unwrap();
            assert_eq!(config.address(), "0.0.0.0:8080");
            assert_eq!(config.request_timeout, Duration::from_secs(30));
            assert_eq!(config.shutdown_timeout, Duration::from_secs(30));
        });
    }

    #[test]
    fn test_server_config_from_env_with_custom_values() {
        temp_env::with_vars(
            [
                ("HOST", Some("127.0.0.1")),
                ("PORT", Some("3000")),
                ("REQUEST_TIMEOUT_SECS", Some("5")),
                ("SHUTDOWN_TIMEOUT_SECS", Some("10")),
            ],
            || {
                let config = ServerConfig::from_env().unwrap();
                assert_eq!(config.address(), "127.0.0.1:3000");
                assert_eq!(config.request_timeout, Duration::from_secs(5));
                assert_eq!(config.shutdown_timeout, Duration::from_secs(10));
            },
        );
    }

    #[test]
    fn test_server_config_from_env_invalid_port() {
        temp_env::with_var("PORT", Some("99999"), || {
            let err = ServerConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("PORT"));
        });
    }

    #[test]
    fn test_server_config_from_env_invalid_timeout() {
        temp_env::with_vars(
            [("PORT", None::<&str>), ("REQUEST_TIMEOUT_SECS", Some("soon"))],
            || {
                let err = ServerConfig::from_env().unwrap_err();
                assert!(err.to_string().contains("REQUEST_TIMEOUT_SECS"));
            },
        );
    }

    #[test]
    fn test_server_config_new_keeps_default_timeouts() {
        let config = ServerConfig::new("localhost".to_string(), 9000);
        assert_eq!(config.address(), "localhost:9000");
        assert_eq!(config.shutdown_timeout, Duration::from_secs(30));
    }
}
