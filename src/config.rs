//! Environment-driven configuration.
//!
//! Every knob has a default suitable for local development, so `cargo run`
//! works with an empty environment.

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// HTTP listener settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (`SERVER_HOST`, default `127.0.0.1`)
    pub host: IpAddr,
    /// Bind port (`SERVER_PORT`, default `8080`)
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            host: env::var("SERVER_HOST")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST)),
            port: env::var("SERVER_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8080),
        }
    }

    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Authentication settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Bearer token provisioned for the bootstrap admin account
    /// (`ADMIN_TOKEN`, default `dev-admin-token`)
    pub admin_token: String,
    /// Email for the bootstrap admin account
    /// (`ADMIN_EMAIL`, default `admin@hostel.local`)
    pub admin_email: String,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        Self {
            admin_token: env::var("ADMIN_TOKEN")
                .unwrap_or_else(|_| "dev-admin-token".to_string()),
            admin_email: env::var("ADMIN_EMAIL")
                .unwrap_or_else(|_| "admin@hostel.local".to_string()),
        }
    }
}

/// Full application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig::from_env(),
            auth: AuthConfig::from_env(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_bind_local_dev_port() {
        let config = ServerConfig {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8080,
        };
        assert_eq!(config.addr().to_string(), "127.0.0.1:8080");
    }
}
