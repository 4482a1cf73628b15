//! Configuration module for phptoro.
//!
//! This module provides centralized configuration loading from environment variables.
//!
//! # Example
//!
//! ```rust,ignore
//! use phptoro::config::Config;
//!
//! let config = Config::from_env()?;
//! println!("Script: {:?}", config.embed.script);
//! println!("Branding: {}", config.embed.branding);
//! ```

mod embed;
mod error;
mod logging;
mod parse;

pub use embed::EmbedConfig;
pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};

/// Complete application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Embedded interpreter configuration.
    pub embed: EmbedConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            embed: EmbedConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
        })
    }

    /// Print configuration summary to log.
    pub fn log_summary(&self) {
        use tracing::info;

        info!("Configuration loaded:");
        info!("  Service: {}", self.logging.service_name);
        info!("  Log format: {}", self.logging.format);

        match self.embed.script {
            Some(ref script) => info!("  Script: {}", script.display()),
            None => info!("  Script: none (pass a path argument)"),
        }

        if self.embed.branding {
            info!("  phpinfo branding: enabled");
        } else {
            info!("  phpinfo branding: disabled");
        }
    }
}
