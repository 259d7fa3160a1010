use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{Result, RelayError};

/// Environment variable selecting the listening port
pub const PORT_ENV: &str = "PORT";

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_binary_path() -> String {
    "yt-dlp".to_string()
}

fn default_stream_buffer_size() -> usize {
    64 * 1024
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on, overridden by the PORT environment variable
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Path to the extraction tool binary (e.g., yt-dlp)
    #[serde(default = "default_binary_path")]
    pub binary_path: String,
    /// Additional arguments passed on every invocation
    /// Common options: ["--proxy", "socks5://127.0.0.1:1080"], ["--cookies", "cookies.txt"]
    #[serde(default)]
    pub extra_args: Vec<String>,
    /// Deadline for metadata extraction; unset means wait for the tool indefinitely
    #[serde(default)]
    pub metadata_timeout_secs: Option<u64>,
    /// Size of the chunks read from the tool's stdout while relaying
    #[serde(default = "default_stream_buffer_size")]
    pub stream_buffer_size: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Directory for daily rotated log files; console only when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            binary_path: default_binary_path(),
            extra_args: vec![
                // Example options users can add:
                // "--proxy".to_string(), "socks5://127.0.0.1:1080".to_string(),
                // "--cookies".to_string(), "cookies.txt".to_string(),
            ],
            metadata_timeout_secs: None,
            stream_buffer_size: default_stream_buffer_size(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RelayError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| RelayError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| RelayError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| RelayError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Apply the PORT environment variable on top of the loaded values
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_port_var(std::env::var(PORT_ENV).ok().as_deref())
    }

    fn apply_port_var(&mut self, value: Option<&str>) -> Result<()> {
        match value.map(str::trim) {
            None | Some("") => Ok(()),
            Some(raw) => {
                self.server.port = raw.parse().map_err(|_| {
                    RelayError::Config(format!("Invalid {} value '{}'", PORT_ENV, raw))
                })?;
                Ok(())
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.extractor.binary_path.trim().is_empty() {
            return Err(RelayError::Config("extractor.binary_path must not be empty".to_string()));
        }
        if self.extractor.stream_buffer_size == 0 {
            return Err(RelayError::Config("extractor.stream_buffer_size must be positive".to_string()));
        }
        if self.extractor.metadata_timeout_secs == Some(0) {
            return Err(RelayError::Config(
                "extractor.metadata_timeout_secs must be positive when set".to_string(),
            ));
        }
        Ok(())
    }

    /// Socket address string the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
