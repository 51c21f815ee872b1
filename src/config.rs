// Server configuration resolved from the command line and environment

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{anyhow, Result};

use crate::downloader::EngineConfig;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_OUTPUT_DIR: &str = "downloads";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Where disk downloads are written and served from
    pub output_dir: PathBuf,
    pub engine: EngineConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            engine: EngineConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        parse_bind_addr(&self.host, self.port)
    }
}

/// Accepts IPv4, bracketed IPv6 and bare IPv6 hosts
fn parse_bind_addr(host: &str, port: u16) -> Result<SocketAddr> {
    let host = host.trim();
    if host.is_empty() {
        return Err(anyhow!("empty bind host"));
    }

    let candidate = if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    };

    candidate
        .parse::<SocketAddr>()
        .map_err(|_| anyhow!("invalid bind address '{candidate}'. Use an IP such as 0.0.0.0 or ::1"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr().unwrap().to_string(), "0.0.0.0:8080");
        assert_eq!(config.output_dir, PathBuf::from("downloads"));
    }

    #[test]
    fn test_ipv6_hosts() {
        assert_eq!(parse_bind_addr("::1", 9000).unwrap().to_string(), "[::1]:9000");
        assert_eq!(parse_bind_addr("[::]", 80).unwrap().to_string(), "[::]:80");
    }

    #[test]
    fn test_invalid_hosts() {
        assert!(parse_bind_addr("", 8080).is_err());
        assert!(parse_bind_addr("localhost", 8080).is_err());
    }
}
