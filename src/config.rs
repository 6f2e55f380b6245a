//! Configuration for ForgeKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{ForgeError, Result};

/// Main configuration for a ForgeKV memtable
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for data files
    /// Internal structure:
    ///   {data_dir}/
    ///     └── wal.log          (write-ahead log)
    pub data_dir: PathBuf,

    /// File name of the write-ahead log inside `data_dir`
    pub wal_file_name: String,

    // -------------------------------------------------------------------------
    // WAL Configuration
    // -------------------------------------------------------------------------
    /// Compress entry values with zstd before they are framed into the log
    pub wal_compression: bool,

    /// Zstd level used when `wal_compression` is on
    pub compression_level: i32,

    /// Number of records handed over per batch while replaying the log
    pub recovery_batch_size: usize,

    // -------------------------------------------------------------------------
    // Skip List Configuration
    // -------------------------------------------------------------------------
    /// Maximum node height in the skip list index
    pub max_level: usize,

    /// Probability of promoting a node to the next level
    pub probability: f64,

    // -------------------------------------------------------------------------
    // MemTable Configuration
    // -------------------------------------------------------------------------
    /// Approximate index size (in bytes) past which a flush policy should act
    pub memtable_size_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./forgekv_data"),
            wal_file_name: "wal.log".to_string(),
            wal_compression: false,
            compression_level: 3,
            recovery_batch_size: 1000,
            max_level: 12,
            probability: 0.5,
            memtable_size_limit: 64 * 1024 * 1024, // 64 MB
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Full path of the write-ahead log
    pub fn wal_path(&self) -> PathBuf {
        self.data_dir.join(&self.wal_file_name)
    }

    /// Reject values the skip list or the WAL reader cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.max_level == 0 {
            return Err(ForgeError::Config("max_level must be at least 1".to_string()));
        }
        if !(self.probability > 0.0 && self.probability < 1.0) {
            return Err(ForgeError::Config(format!(
                "probability must be in (0, 1), got {}",
                self.probability
            )));
        }
        if self.recovery_batch_size == 0 {
            return Err(ForgeError::Config(
                "recovery_batch_size must be at least 1".to_string(),
            ));
        }
        if self.wal_file_name.is_empty() {
            return Err(ForgeError::Config("wal_file_name must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the WAL file name
    pub fn wal_file_name(mut self, name: impl Into<String>) -> Self {
        self.config.wal_file_name = name.into();
        self
    }

    /// Enable or disable value compression in the WAL
    pub fn wal_compression(mut self, enabled: bool) -> Self {
        self.config.wal_compression = enabled;
        self
    }

    /// Set the zstd compression level
    pub fn compression_level(mut self, level: i32) -> Self {
        self.config.compression_level = level;
        self
    }

    /// Set the number of records per recovery batch
    pub fn recovery_batch_size(mut self, size: usize) -> Self {
        self.config.recovery_batch_size = size;
        self
    }

    /// Set the maximum skip list level
    pub fn max_level(mut self, level: usize) -> Self {
        self.config.max_level = level;
        self
    }

    /// Set the level promotion probability
    pub fn probability(mut self, p: f64) -> Self {
        self.config.probability = p;
        self
    }

    /// Set the memtable size limit (in bytes)
    pub fn memtable_size_limit(mut self, size: usize) -> Self {
        self.config.memtable_size_limit = size;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
