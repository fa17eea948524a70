//! Layered configuration for the client and CLI.
//!
//! Configuration is read from three TOML files, later files overriding
//! earlier ones: the system file, the per-user file, and a `fahctl.toml` in
//! the working directory. All fields have defaults, so absent files and
//! partial files are fine.

use std::fs;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::client::transport::TransportOptions;

/// Client configuration: server endpoints, credential files, TLS behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the assignment server API.
    pub as_api_url: String,

    /// Base URL of the work server API.
    pub ws_api_url: String,

    /// IP address identifying this work server to the assignment server.
    pub ws_ip_addr: Ipv4Addr,

    /// Path to the PEM client certificate.
    pub certificate_file: PathBuf,

    /// Path to the PEM RSA private key.
    pub key_file: PathBuf,

    /// Verify the server certificate. Disabling this is an explicit,
    /// logged choice.
    pub verify: bool,

    /// Overall request timeout in seconds (no timeout when unset).
    pub timeout_secs: Option<f64>,

    /// Connection timeout in seconds (no timeout when unset).
    pub connect_timeout_secs: Option<f64>,

    /// Default output format for the CLI ("table" or "json").
    pub format: String,

    /// Log level (error, warn, info, debug, trace).
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            as_api_url: "https://localhost:8080".to_string(),
            ws_api_url: "https://localhost:8084".to_string(),
            ws_ip_addr: Ipv4Addr::LOCALHOST,
            certificate_file: PathBuf::from("api-certificate.pem"),
            key_file: PathBuf::from("api-private.pem"),
            verify: true,
            timeout_secs: None,
            connect_timeout_secs: None,
            format: "table".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl ClientConfig {
    pub fn transport_options(&self) -> TransportOptions {
        TransportOptions {
            insecure: !self.verify,
            timeout: self.timeout_secs.map(Duration::from_secs_f64),
            connect_timeout: self.connect_timeout_secs.map(Duration::from_secs_f64),
        }
    }
}

/// Top-level configuration file contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FahConfig {
    pub client: ClientConfig,
}

/// The configuration file locations, in override order.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub system: PathBuf,
    pub user: Option<PathBuf>,
    pub local: PathBuf,
}

impl ConfigPaths {
    pub fn new() -> Self {
        ConfigPaths {
            system: PathBuf::from("/etc/fahctl/config.toml"),
            user: dirs::config_dir().map(|dir| dir.join("fahctl").join("config.toml")),
            local: PathBuf::from("fahctl.toml"),
        }
    }

    /// The subset of paths that exist, lowest precedence first.
    pub fn existing_paths(&self) -> Vec<PathBuf> {
        let mut paths = vec![self.system.clone()];
        if let Some(user) = &self.user {
            paths.push(user.clone());
        }
        paths.push(self.local.clone());
        paths.into_iter().filter(|p| p.is_file()).collect()
    }
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self::new()
    }
}

impl FahConfig {
    /// Load configuration from the standard locations, returning defaults
    /// when no file exists.
    pub fn load() -> Result<Self> {
        Self::load_from_paths(&ConfigPaths::new())
    }

    pub fn load_from_paths(paths: &ConfigPaths) -> Result<Self> {
        let mut merged = toml::Value::Table(toml::map::Map::new());
        for path in paths.existing_paths() {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            let value: toml::Value = text
                .parse()
                .with_context(|| format!("parsing config file {}", path.display()))?;
            merge(&mut merged, value);
        }
        merged
            .try_into()
            .context("invalid configuration")
    }
}

/// Overlay `overlay` onto `base`, table keys recursively, scalars replaced.
fn merge(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
