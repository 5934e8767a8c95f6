//! Server configuration

use std::net::{IpAddr, Ipv4Addr};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Cookie signing key; a random key is generated when absent
    pub secret_key: Option<Vec<u8>>,
    /// Mark the session cookie `Secure`
    pub secure_cookies: bool,
}

impl ServerConfig {
    /// Create a new configuration builder
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8080,
            secret_key: None,
            secure_cookies: false,
        }
    }
}

/// Builder for ServerConfig
#[derive(Debug, Default)]
pub struct ServerConfigBuilder {
    host: Option<IpAddr>,
    port: Option<u16>,
    secret_key: Option<Vec<u8>>,
    secure_cookies: Option<bool>,
}

impl ServerConfigBuilder {
    /// Set the bind address
    pub fn host(mut self, host: IpAddr) -> Self {
        self.host = Some(host);
        self
    }

    /// Set the port
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the cookie signing key (at least 64 bytes)
    pub fn secret_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.secret_key = Some(key.into());
        self
    }

    /// Mark the session cookie `Secure`
    pub fn secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = Some(secure);
        self
    }

    /// Build the configuration
    pub fn build(self) -> ServerConfig {
        let defaults = ServerConfig::default();
        ServerConfig {
            host: self.host.unwrap_or(defaults.host),
            port: self.port.unwrap_or(defaults.port),
            secret_key: self.secret_key,
            secure_cookies: self.secure_cookies.unwrap_or(defaults.secure_cookies),
        }
    }
}
