//! Miner configuration
//!
//! Loaded from a JSON file (`~/.x16r/config.json` unless `--config` points
//! elsewhere); command-line flags override individual fields.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cpu::detect_batch_width;

/// Default nonces each worker scans between progress updates
pub const DEFAULT_CHUNK_SIZE: u32 = 4096;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("File I/O error: {0}")]
    FileError(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Miner settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinerConfig {
    /// Worker threads (default: number of CPU cores)
    pub threads: Option<usize>,
    /// Scanner batch width (default: detected from the CPU)
    pub lanes: Option<usize>,
    /// First nonce of the search
    pub nonce_start: u32,
    /// Last nonce of the search, inclusive
    pub nonce_end: u32,
    /// Nonces per worker between progress updates
    pub chunk_size: u32,
    /// Seconds between hash-rate reports
    pub report_interval_secs: u64,
    /// Cancel every worker once a solution is found
    pub stop_on_first: bool,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            threads: None,
            lanes: None,
            nonce_start: 0,
            nonce_end: u32::MAX,
            chunk_size: DEFAULT_CHUNK_SIZE,
            report_interval_secs: 2,
            stop_on_first: true,
        }
    }
}

impl MinerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: MinerConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path`, or the default location when it exists, or defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let path = default_config_path();
                if path.exists() {
                    Self::load(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nonce_start > self.nonce_end {
            return Err(ConfigError::Invalid(format!(
                "nonce_start {} is past nonce_end {}",
                self.nonce_start, self.nonce_end
            )));
        }
        if self.threads == Some(0) {
            return Err(ConfigError::Invalid("threads must be at least 1".into()));
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid("chunk_size must be at least 1".into()));
        }
        if let Some(lanes) = self.lanes {
            if !x16r_core::BATCH_WIDTHS.contains(&lanes) {
                return Err(ConfigError::Invalid(format!(
                    "lanes must be one of {:?}, got {}",
                    x16r_core::BATCH_WIDTHS,
                    lanes
                )));
            }
        }
        Ok(())
    }

    pub fn resolved_threads(&self) -> usize {
        self.threads.unwrap_or_else(num_cpus::get)
    }

    pub fn resolved_lanes(&self) -> usize {
        self.lanes.unwrap_or_else(detect_batch_width)
    }
}

/// Get the default config file path
pub fn default_config_path() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".x16r").join("config.json")
}
