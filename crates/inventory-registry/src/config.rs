//! Configuration management for the Inventory Registry
//!
//! Values come from command-line flags, falling back to environment variables
//! (a `.env` file is loaded first if present).

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use crate::handlers::DEFAULT_MAX_UPLOAD_BYTES;
use crate::photos::PHOTOS_DIR;

/// Application configuration
#[derive(Parser, Debug, Clone)]
#[command(name = "inventory-registry")]
#[command(about = "Inventory registration service with on-disk records and photos")]
#[command(disable_help_flag = true)]
pub struct Config {
    /// Server host
    #[arg(short = 'h', long, env = "INVENTORY_HOST")]
    pub host: String,

    /// Server port
    #[arg(short = 'p', long, env = "INVENTORY_PORT")]
    pub port: u16,

    /// Cache directory holding inventory.json and photos/
    #[arg(short = 'c', long = "cache", env = "INVENTORY_CACHE_DIR")]
    pub cache_dir: PathBuf,

    /// Directory of static files served for unmatched routes
    #[arg(long, env = "INVENTORY_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    /// Maximum request body size in bytes
    #[arg(long, env = "INVENTORY_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,

    /// Print help
    #[arg(long, action = clap::ArgAction::Help)]
    help: Option<bool>,
}

impl Config {
    /// Load configuration from the process arguments and environment.
    ///
    /// Exits the process with clap's usage error if a required value is missing.
    pub fn load() -> Result<Self> {
        // Load .env file if it exists (for local development)
        dotenvy::dotenv().ok();

        Self::parse().finish()
    }

    /// Parse from an explicit argument list
    pub fn from_args<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::try_parse_from(args)
            .context("Invalid arguments")?
            .finish()
    }

    fn finish(mut self) -> Result<Self> {
        if self.cache_dir.is_relative() {
            self.cache_dir = std::env::current_dir()
                .context("Failed to read current directory")?
                .join(&self.cache_dir);
        }

        self.validate()?;
        Ok(self)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("port must be greater than 0");
        }

        if self.max_upload_bytes == 0 {
            anyhow::bail!("max upload size must be greater than 0");
        }

        Ok(())
    }

    /// Get the API server address
    pub fn api_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Ensure the cache directory and its photo directory exist
    pub fn ensure_directories(&self) -> Result<()> {
        let photos_dir = self.cache_dir.join(PHOTOS_DIR);
        std::fs::create_dir_all(&photos_dir).with_context(|| {
            format!(
                "Failed to create photo directory: {}",
                photos_dir.display()
            )
        })?;

        if let Some(static_dir) = &self.static_dir {
            if !static_dir.exists() {
                tracing::warn!("Static directory does not exist: {}", static_dir.display());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(port: u16, max_upload_bytes: usize) -> Config {
        Config {
            host: "127.0.0.1".to_string(),
            port,
            cache_dir: PathBuf::from("/tmp/cache"),
            static_dir: None,
            max_upload_bytes,
            help: None,
        }
    }

    #[test]
    fn test_parse_short_flags() {
        let config =
            Config::from_args(["inventory-registry", "-h", "0.0.0.0", "-p", "3000", "-c", "/var/cache/inv"])
                .expect("Failed to parse config");

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.cache_dir, PathBuf::from("/var/cache/inv"));
        assert!(config.static_dir.is_none());
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
    }

    #[test]
    fn test_relative_cache_dir_is_absolutized() {
        let config = Config::from_args([
            "inventory-registry",
            "--host",
            "127.0.0.1",
            "--port",
            "3000",
            "--cache",
            "cache",
        ])
        .unwrap();

        assert!(config.cache_dir.is_absolute());
        assert!(config.cache_dir.ends_with("cache"));
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let result = Config::from_args([
            "inventory-registry",
            "-h",
            "127.0.0.1",
            "-p",
            "not-a-port",
            "-c",
            "/tmp/cache",
        ]);

        assert!(result.is_err());
    }

    #[test]
    fn test_api_address() {
        assert_eq!(config(9000, 1).api_address(), "127.0.0.1:9000");
    }

    #[test]
    fn test_validate_invalid_port() {
        let result = config(0, 1).validate();
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("port must be greater than 0"));
    }

    #[test]
    fn test_ensure_directories_creates_layout() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(8080, 1);
        config.cache_dir = dir.path().join("cache");

        config.ensure_directories().unwrap();

        assert!(config.cache_dir.is_dir());
        assert!(config.cache_dir.join("photos").is_dir());
    }

    #[test]
    fn test_validate_zero_upload_limit() {
        assert!(config(8080, 0).validate().is_err());
        assert!(config(8080, 1).validate().is_ok());
    }
}
