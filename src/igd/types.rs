//! Common types for the UPnP IGD client

use std::fmt;
use thiserror::Error;

/// WAN connection service variants understood by the client
///
/// Each variant is a distinct UPnP service type with its own URN. The
/// operations used here (port mappings and external address lookup) are
/// structurally identical across all three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceVariant {
    /// `urn:schemas-upnp-org:service:WANIPConnection:1`
    WanIpConnection1,
    /// `urn:schemas-upnp-org:service:WANIPConnection:2`
    WanIpConnection2,
    /// `urn:schemas-upnp-org:service:WANPPPConnection:1`
    WanPppConnection1,
}

impl ServiceVariant {
    /// All variants in selection priority order (most capable first)
    pub const PRIORITY: [ServiceVariant; 3] = [
        ServiceVariant::WanIpConnection2,
        ServiceVariant::WanIpConnection1,
        ServiceVariant::WanPppConnection1,
    ];

    /// Service type URN used in SSDP searches and SOAP actions
    pub fn urn(&self) -> &'static str {
        match self {
            Self::WanIpConnection1 => "urn:schemas-upnp-org:service:WANIPConnection:1",
            Self::WanIpConnection2 => "urn:schemas-upnp-org:service:WANIPConnection:2",
            Self::WanPppConnection1 => "urn:schemas-upnp-org:service:WANPPPConnection:1",
        }
    }

    /// Short name, e.g. `WANIPConnection:2`
    pub fn name(&self) -> &'static str {
        match self {
            Self::WanIpConnection1 => "WANIPConnection:1",
            Self::WanIpConnection2 => "WANIPConnection:2",
            Self::WanPppConnection1 => "WANPPPConnection:1",
        }
    }
}

impl fmt::Display for ServiceVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Transport protocol of a port mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortMappingProtocol {
    /// TCP protocol
    TCP,
    /// UDP protocol
    UDP,
}

impl PortMappingProtocol {
    /// Both protocols, in the order mappings are applied
    pub const BOTH: [PortMappingProtocol; 2] = [PortMappingProtocol::TCP, PortMappingProtocol::UDP];

    /// Wire representation (`NewProtocol` argument)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TCP => "TCP",
            Self::UDP => "UDP",
        }
    }
}

impl fmt::Display for PortMappingProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Arguments of an `AddPortMapping` action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortMappingRequest {
    /// Remote host filter (empty = any remote host)
    pub remote_host: String,
    /// External port on the gateway
    pub external_port: u16,
    /// Transport protocol
    pub protocol: PortMappingProtocol,
    /// Port on the internal client
    pub internal_port: u16,
    /// Internal client IP address
    pub internal_client: String,
    /// Whether the mapping is active
    pub enabled: bool,
    /// Human readable description stored on the gateway
    pub description: String,
    /// Lease duration in seconds (0 = no expiry requested)
    pub lease_duration: u32,
}

/// A port mapping as reported by `GetSpecificPortMappingEntry`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortMappingEntry {
    /// Port on the internal client
    pub internal_port: u16,
    /// Internal client IP address
    pub internal_client: String,
    /// Whether the mapping is active
    pub enabled: bool,
    /// Description stored on the gateway
    pub description: String,
    /// Remaining lease duration in seconds
    pub lease_duration: u32,
}

/// Errors raised while talking to a UPnP device
#[derive(Debug, Error)]
pub enum UpnpError {
    /// Socket error during SSDP search
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Malformed XML document
    #[error("Malformed XML: {0}")]
    Xml(#[from] xmltree::ParseError),

    /// Well-formed but unexpected response
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The device answered with a UPnP SOAP fault
    #[error("UPnP error {code}: {description}")]
    Soap {
        /// UPnP error code (e.g. 714 NoSuchEntryInArray)
        code: u16,
        /// Error description from the device
        description: String,
    },

    /// The device answered with an HTTP error and no UPnP fault
    #[error("{action} failed with HTTP status {status}")]
    HttpStatus {
        /// SOAP action that was invoked
        action: String,
        /// HTTP status code
        status: u16,
    },
}
