//! Command line tool settings

use crate::igd::SearchOptions;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Default description stored with new mappings
pub const DEFAULT_DESCRIPTION: &str = "upnp-cli";

/// Tool settings
///
/// Stored as JSON. Missing fields take their default value, and a missing or
/// empty file yields the defaults.
///
/// # Example
/// ```rust,no_run
/// use upnp_cli::settings::Settings;
///
/// let settings = Settings::load("upnp.json").expect("Failed to load");
/// println!("Searching for {}s", settings.search_timeout_secs);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// How long to collect SSDP replies, in seconds
    pub search_timeout_secs: u64,
    /// Timeout of each description / SOAP request, in seconds
    pub http_timeout_secs: u64,
    /// Local IPv4 address the SSDP socket binds to (all interfaces if unset)
    pub bind_addr: Option<Ipv4Addr>,
    /// Description used when none is given on the command line
    pub default_description: String,
    /// Fail discovery when any device description cannot be read
    pub strict_discovery: bool,
}

impl Settings {
    /// Load settings from a JSON file
    ///
    /// # Arguments
    /// * `path` - Path to the settings file
    ///
    /// # Returns
    /// The loaded settings, or default settings if the file doesn't exist
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let data = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read settings: {}", e)))?;

        if data.trim().is_empty() {
            return Ok(Self::default());
        }

        let settings: Self = serde_json::from_str(&data)
            .map_err(|e| Error::Config(format!("Failed to parse settings: {}", e)))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to a JSON file, creating parent directories
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create settings directory: {}", e)))?;
        }

        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .map_err(|e| Error::Config(format!("Failed to write settings: {}", e)))?;

        Ok(())
    }

    /// Reject values discovery cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.search_timeout_secs == 0 {
            return Err(Error::Config("search_timeout_secs must be at least 1".to_string()));
        }
        if self.http_timeout_secs == 0 {
            return Err(Error::Config("http_timeout_secs must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Discovery options derived from these settings
    pub fn search_options(&self) -> SearchOptions {
        let bind_ip = self.bind_addr.unwrap_or(Ipv4Addr::UNSPECIFIED);

        SearchOptions {
            bind_addr: SocketAddr::new(IpAddr::V4(bind_ip), 0),
            timeout: Duration::from_secs(self.search_timeout_secs),
            http_timeout: Duration::from_secs(self.http_timeout_secs),
        }
    }

    /// `description` if non-empty, otherwise the configured default
    pub fn description_or_default(&self, description: &[String]) -> String {
        let joined = description.join(" ");
        if joined.trim().is_empty() {
            self.default_description.clone()
        } else {
            joined
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            search_timeout_secs: 3,
            http_timeout_secs: 5,
            bind_addr: None,
            default_description: DEFAULT_DESCRIPTION.to_string(),
            strict_discovery: true,
        }
    }
}
