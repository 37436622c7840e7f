//! ==============================================================================
//! config.rs - Runtime Configuration Loader
//! ==============================================================================
//!
//! purpose:
//!     defines the schema for `sitemon.toml`.
//!     loads configuration from file or falls back to defaults.
//!
//! structure:
//!     - ServerConfig: where the dashboard is served.
//!     - SourceConfig: path to the CSV sensor feed and the snapshot cache TTL.
//!     - RefreshConfig: cadence of the background refresh task (and of the
//!       page's redraw timer, which the server hands to the browser).
//!     - LoggingConfig: log level and per-cycle reading output.
//!
//! environment overrides:
//!     SITEMON_CONFIG     - explicit config file path, tried first
//!     SITEMON_DATA_FILE  - overrides [source] data_file
//!
//! ==============================================================================

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct HostConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    /// path to the CSV sensor feed
    pub data_file: PathBuf,
    /// how long a fetched snapshot stays fresh
    pub cache_ttl_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RefreshConfig {
    pub interval_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub show_readings: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("data").join("readings.csv"),
            cache_ttl_seconds: 60,
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 60,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            show_readings: true,
        }
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            source: SourceConfig::default(),
            refresh: RefreshConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl HostConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;

        let config: HostConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config: {}", e))?;

        Ok(config)
    }

    /// Load with default fallback, then apply environment overrides.
    ///
    /// Runs before the logger is initialized, so this reports via println.
    pub fn load_or_default() -> Self {
        let mut paths = Vec::new();
        if let Ok(explicit) = std::env::var("SITEMON_CONFIG") {
            paths.push(PathBuf::from(explicit));
        }
        paths.push(PathBuf::from("sitemon.toml"));
        paths.push(PathBuf::from("config").join("sitemon.toml"));

        let mut config = None;
        for path in &paths {
            if path.exists() {
                match Self::load(path) {
                    Ok(loaded) => {
                        println!("[CONFIG] Loaded from {}", path.display());
                        config = Some(loaded);
                        break;
                    }
                    Err(e) => {
                        println!("[CONFIG] Warning: Failed to load {}: {}", path.display(), e);
                    }
                }
            }
        }

        let mut config = config.unwrap_or_else(|| {
            println!("[CONFIG] Warning: No config file found - using defaults");
            Self::default()
        });

        if let Ok(data_file) = std::env::var("SITEMON_DATA_FILE") {
            println!("[CONFIG] SITEMON_DATA_FILE overrides data file: {}", data_file);
            config.source.data_file = PathBuf::from(data_file);
        }

        config
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        println!("┌─────────────────────────────────────────┐");
        println!("│          SITEMON CONFIGURATION          │");
        println!("├─────────────────────────────────────────┤");
        println!("│ Bind: {}", self.server.bind_addr);
        println!("│ Data File: {}", self.source.data_file.display());
        println!("│ Cache TTL: {}s", self.source.cache_ttl_seconds);
        println!("│ Refresh: {}s", self.refresh.interval_seconds);
        println!("│ Log Level: {}", self.logging.level);
        println!("└─────────────────────────────────────────┘");
    }
}
