//! Configuration file handling

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

use super::{Error, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Control-plane API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Execution settings
    #[serde(default)]
    pub framework: FrameworkConfig,
}

/// Control-plane API settings
#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Base URL of the API, without trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Endpoint paths relative to `base_url`
    #[serde(default)]
    pub endpoints: Endpoints,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            endpoints: Endpoints::default(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_timeout() -> u64 {
    10
}

/// Endpoint paths
#[derive(Debug, Deserialize, Clone)]
pub struct Endpoints {
    #[serde(default = "default_register")]
    pub register: String,
    #[serde(default = "default_login")]
    pub login: String,
    #[serde(default = "default_tenants")]
    pub tenants: String,
    #[serde(default = "default_virtual_services")]
    pub virtual_services: String,
    #[serde(default = "default_service_engines")]
    pub service_engines: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            register: default_register(),
            login: default_login(),
            tenants: default_tenants(),
            virtual_services: default_virtual_services(),
            service_engines: default_service_engines(),
        }
    }
}

fn default_register() -> String {
    "/register".to_string()
}
fn default_login() -> String {
    "/login1".to_string()
}
fn default_tenants() -> String {
    "/api/tenant".to_string()
}
fn default_virtual_services() -> String {
    "/api/virtualservice".to_string()
}
fn default_service_engines() -> String {
    "/api/serviceengine".to_string()
}

/// Execution settings
#[derive(Debug, Deserialize, Clone)]
pub struct FrameworkConfig {
    /// Run test cases concurrently by default
    #[serde(default)]
    pub parallel: bool,

    /// Upper bound on concurrently running test cases
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Pause between consecutive test cases in sequential mode
    #[serde(default = "default_pacing")]
    pub pacing_secs: u64,

    /// Directory for the execution log file
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            parallel: false,
            max_workers: default_max_workers(),
            pacing_secs: default_pacing(),
            log_dir: default_log_dir(),
        }
    }
}

fn default_max_workers() -> usize {
    3
}
fn default_pacing() -> u64 {
    1
}
fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

/// Credentials file wrapper (`[credentials]` table)
#[derive(Debug, Deserialize)]
struct CredentialsFile {
    credentials: Credentials,
}

/// API credentials
#[derive(Deserialize, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns default configuration if the file doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))?;
        if config.framework.max_workers == 0 {
            return Err(Error::Configuration(
                "framework.max_workers must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }
}

impl Credentials {
    /// Load credentials from a TOML file with a `[credentials]` table
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
        let file: CredentialsFile =
            toml::from_str(&content).map_err(|e| Error::ConfigParse(e.to_string()))?;
        Ok(file.credentials)
    }
}
