//! Common types for router discovery and port mapping

use crate::igd::{PortMappingProtocol, ServiceVariant, UpnpError};
use std::fmt;
use thiserror::Error;

/// Discovered handles, one sequence per service variant
///
/// Only lives between probing and selection.
#[derive(Debug)]
pub struct CandidateSet<T> {
    /// `WANIPConnection:2` handles
    pub ip2: Vec<T>,
    /// `WANIPConnection:1` handles
    pub ip1: Vec<T>,
    /// `WANPPPConnection:1` handles
    pub ppp1: Vec<T>,
}

impl<T> CandidateSet<T> {
    /// Number of handles per variant, in priority order
    pub fn counts(&self) -> CandidateCounts {
        CandidateCounts {
            ip2: self.ip2.len(),
            ip1: self.ip1.len(),
            ppp1: self.ppp1.len(),
        }
    }

    /// Remove and return the handles of `variant`
    pub fn take(&mut self, variant: ServiceVariant) -> Vec<T> {
        let slot = match variant {
            ServiceVariant::WanIpConnection2 => &mut self.ip2,
            ServiceVariant::WanIpConnection1 => &mut self.ip1,
            ServiceVariant::WanPppConnection1 => &mut self.ppp1,
        };
        std::mem::take(slot)
    }
}

impl<T> Default for CandidateSet<T> {
    fn default() -> Self {
        Self {
            ip2: Vec::new(),
            ip1: Vec::new(),
            ppp1: Vec::new(),
        }
    }
}

/// Candidate counts per variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateCounts {
    /// `WANIPConnection:2` handles found
    pub ip2: usize,
    /// `WANIPConnection:1` handles found
    pub ip1: usize,
    /// `WANPPPConnection:1` handles found
    pub ppp1: usize,
}

impl fmt::Display for CandidateCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}, {}: {}, {}: {}",
            ServiceVariant::WanIpConnection2,
            self.ip2,
            ServiceVariant::WanIpConnection1,
            self.ip1,
            ServiceVariant::WanPppConnection1,
            self.ppp1
        )
    }
}

/// Remote port mapping operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingOperation {
    /// `AddPortMapping`
    Add,
    /// `DeletePortMapping`
    Delete,
    /// `GetSpecificPortMappingEntry`
    Query,
}

impl fmt::Display for MappingOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "AddPortMapping",
            Self::Delete => "DeletePortMapping",
            Self::Query => "GetSpecificPortMappingEntry",
        })
    }
}

/// Errors that can occur while selecting or driving a router
#[derive(Debug, Error)]
pub enum RouterError {
    /// Enumerating one of the service variants failed
    #[error("Discovery of {variant} devices failed: {source}")]
    Discovery {
        /// Variant whose enumeration failed
        variant: ServiceVariant,
        /// Underlying client error
        #[source]
        source: UpnpError,
    },

    /// No variant had exactly one candidate
    #[error(
        "multiple or no services found ({counts}); \
         if more than one gateway is on this network, none can be picked automatically"
    )]
    AmbiguousOrNoRouter {
        /// Candidates found per variant
        counts: CandidateCounts,
    },

    /// The local address facing the router could not be determined
    #[error("{0}")]
    LocalIpResolution(String),

    /// A remote port mapping call failed
    #[error("{operation} for port {port}/{protocol} failed: {source}")]
    RemoteMapping {
        /// Operation attempted
        operation: MappingOperation,
        /// External port
        port: u16,
        /// Transport protocol of the failed half
        protocol: PortMappingProtocol,
        /// Underlying client error
        #[source]
        source: UpnpError,
    },

    /// `GetExternalIPAddress` failed
    #[error("GetExternalIPAddress failed: {0}")]
    ExternalIp(#[source] UpnpError),

    /// Discovery was cancelled before it finished
    #[error("Router discovery cancelled")]
    Cancelled,

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
