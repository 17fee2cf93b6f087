//! Server configuration from environment variables.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::error::ConfigError;

pub const DEFAULT_PORT: u16 = 8765;

#[derive(Debug, Clone, PartialEq)]
pub struct HubConfig {
    /// Address the HTTP/WebSocket listener binds to
    pub bind_addr: SocketAddr,
    /// Whether to allow cross-origin requests from anywhere
    pub cors_permissive: bool,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            cors_permissive: true,
        }
    }
}

impl HubConfig {
    /// Load config from HUB_HOST, HUB_PORT and HUB_CORS_PERMISSIVE.
    /// Invalid values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = match parse_var("HUB_HOST", |v| v.parse::<IpAddr>().ok()) {
            Ok(host) => host.unwrap_or(defaults.bind_addr.ip()),
            Err(e) => {
                tracing::warn!("{}, using {}", e, defaults.bind_addr.ip());
                defaults.bind_addr.ip()
            }
        };

        let port = match parse_var("HUB_PORT", |v| v.parse::<u16>().ok()) {
            Ok(port) => port.unwrap_or(DEFAULT_PORT),
            Err(e) => {
                tracing::warn!("{}, using {}", e, DEFAULT_PORT);
                DEFAULT_PORT
            }
        };

        let cors_permissive = std::env::var("HUB_CORS_PERMISSIVE")
            .map(|v| v != "0" && v.to_lowercase() != "false")
            .unwrap_or(defaults.cors_permissive);

        let config = Self {
            bind_addr: SocketAddr::new(host, port),
            cors_permissive,
        };
        tracing::info!(
            bind_addr = %config.bind_addr,
            cors_permissive = config.cors_permissive,
            "Hub config loaded"
        );
        config
    }
}

/// Read and parse an optional variable; unset or empty yields `Ok(None)`
fn parse_var<T>(
    key: &'static str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>, ConfigError> {
    let Ok(raw) = std::env::var(key) else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    parse(raw).map(Some).ok_or_else(|| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}
