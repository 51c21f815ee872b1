// Engine configuration

use crate::downloader::utils::find_ytdlp;

/// Knobs passed to the yt-dlp engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Path to the yt-dlp executable
    pub binary: String,
    /// Upper bound for a metadata probe, in seconds
    pub timeout_seconds: u64,
    /// Network socket timeout handed to the engine
    pub socket_timeout: u32,
    /// SOCKS5/HTTP proxy URL
    pub proxy: Option<String>,
    /// Path to cookies.txt file
    pub cookies_path: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            binary: find_ytdlp(),
            timeout_seconds: 60,
            socket_timeout: 30,
            proxy: None,
            cookies_path: None,
        }
    }
}

impl EngineConfig {
    pub fn with_binary(mut self, binary: Option<String>) -> Self {
        if let Some(binary) = binary.filter(|b| !b.trim().is_empty()) {
            self.binary = binary;
        }
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds.max(1);
        self
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_cookies_path(mut self, path: Option<String>) -> Self {
        self.cookies_path = path;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides() {
        let config = EngineConfig::default()
            .with_binary(Some("/tmp/yt-dlp".to_string()))
            .with_timeout(0)
            .with_proxy(Some("socks5://127.0.0.1:9050".to_string()));
        assert_eq!(config.binary, "/tmp/yt-dlp");
        assert_eq!(config.timeout_seconds, 1);
        assert!(config.proxy.is_some());
        assert!(config.cookies_path.is_none());
    }

    #[test]
    fn test_blank_binary_keeps_default() {
        let default_binary = EngineConfig::default().binary;
        let config = EngineConfig::default().with_binary(Some("  ".to_string()));
        assert_eq!(config.binary, default_binary);
    }
}
