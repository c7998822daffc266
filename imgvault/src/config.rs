//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable and command-line
//! overrides. The configuration file path defaults to `config.yaml` but can be specified via
//! `-f` flag or `IMGVAULT_CONFIG` environment variable. A missing file is not an error.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `IMGVAULT_` override YAML values
//! 3. **Command-line flags** - `--host`, `--port`, `--dir`, `--domain`, `--log-level`, `--pubkey`
//!
//! ## Usage
//!
//! ```no_run
//! use clap::Parser;
//! use imgvault::config::{Args, Config};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let args = Args::parse();
//! let config = Config::load(&args)?;
//!
//! println!("Server will bind to {}:{}", config.host, config.port);
//! # Ok(())
//! # }
//! ```
//!
//! ## Example
//!
//! ```yaml
//! host: 0.0.0.0
//! port: 8080
//! dir: /var/lib/imgvault
//! domain: https://img.example.com
//! log_level: info
//! pubkeys:
//!   - 1b84c5567b126440995d3ed5aaba0565d71e1834604819ff9c17f5e9d5dd078f
//! shutdown_grace_period: 10s
//! ```
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! IMGVAULT_PORT=9000
//! IMGVAULT_DOMAIN=https://img.example.com
//! IMGVAULT_PUBKEYS='[1b84c5567b126440995d3ed5aaba0565d71e1834604819ff9c17f5e9d5dd078f]'
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};
use tracing_subscriber::EnvFilter;
use url::Url;

use crate::auth::AllowList;
use crate::auth::signature::decode_pubkey;
use crate::errors::Error;

/// CLI args: config file location plus per-field overrides
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "IMGVAULT_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,

    #[command(flatten)]
    pub overrides: Overrides,
}

/// Command-line overrides, applied on top of the file and environment.
///
/// Unset flags are skipped when serializing so they never mask lower-priority sources.
#[derive(clap::Args, Debug, Default, Serialize)]
pub struct Overrides {
    /// Host to listen on
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Directory to store and serve files from
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,

    /// Public base URL files are served under
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Public key allowed to upload (repeatable)
    #[arg(long = "pubkey", value_name = "HEX")]
    #[serde(rename = "pubkeys", skip_serializing_if = "Vec::is_empty")]
    pub pubkeys: Vec<String>,
}

/// Main application configuration.
///
/// All fields have defaults except `domain`, which validation requires.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Root directory for stored files, created on startup if missing
    pub dir: PathBuf,
    /// Absolute base URL used to build the links returned to uploaders (e.g., "https://img.example.com")
    pub domain: Option<Url>,
    /// Log filter directive, used when `RUST_LOG` is not set
    pub log_level: String,
    /// Hex x-only public keys allowed to upload. Empty means any valid signature is accepted.
    pub pubkeys: Vec<String>,
    /// How long in-flight requests get to finish after a shutdown signal
    #[serde(with = "humantime_serde")]
    pub shutdown_grace_period: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            dir: PathBuf::from("./uploads"),
            domain: None,
            log_level: "info".to_string(),
            pubkeys: Vec::new(),
            shutdown_grace_period: Duration::from_secs(10),
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        let Some(domain) = &self.domain else {
            return Err(Error::Internal {
                operation: "Config validation: domain must be set. \
                            Please set IMGVAULT_DOMAIN, pass --domain, or add domain to the config file."
                    .to_string(),
            });
        };

        if !matches!(domain.scheme(), "http" | "https") || domain.cannot_be_a_base() || domain.host().is_none() {
            return Err(Error::Internal {
                operation: format!("Config validation: domain '{domain}' must be an absolute http(s) URL"),
            });
        }

        if let Err(e) = EnvFilter::try_new(&self.log_level) {
            return Err(Error::Internal {
                operation: format!("Config validation: invalid log_level '{}': {e}", self.log_level),
            });
        }

        for pubkey in &self.pubkeys {
            decode_pubkey(pubkey).map_err(|e| Error::Internal {
                operation: format!("Config validation: invalid pubkey '{pubkey}': {e}"),
            })?;
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values
            .merge(Env::prefixed("IMGVAULT_").ignore(&["config"]).split("__"))
            // Explicit flags win over everything
            .merge(Serialized::defaults(&args.overrides))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The configured public keys as an allowlist
    pub fn allowlist(&self) -> AllowList {
        AllowList::new(self.pubkeys.iter().cloned())
    }
}
