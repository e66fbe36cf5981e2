//! The selected router and its port mapping operations

use super::local_ip::{resolve_local_ip, InterfaceSource, SystemInterfaces};
use super::types::{MappingOperation, RouterError};
use crate::igd::{BoxedConnection, PortMappingEntry, PortMappingProtocol, PortMappingRequest, ServiceVariant};
use std::fmt;
use std::net::IpAddr;
use tracing::info;

/// Lease duration requested for every mapping (no expiry requested)
pub const LEASE_DURATION: u32 = 0;

/// Handle to the one gateway control endpoint chosen for this run
///
/// The local address facing the router is resolved on first use and cached
/// for the lifetime of the handle.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
/// use upnp_cli::igd::{SearchOptions, SsdpDeviceFinder};
/// use upnp_cli::router::discover_and_select_router;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let finder = Arc::new(SsdpDeviceFinder::new(SearchOptions::default()));
/// let mut router = discover_and_select_router(finder, &CancellationToken::new()).await?;
/// router.forward(8080, "web server").await?;
/// router.clear(8080).await?;
/// # Ok(())
/// # }
/// ```
pub struct RouterClient {
    connection: BoxedConnection,
    interfaces: Box<dyn InterfaceSource>,
    local_ip: Option<IpAddr>,
}

impl RouterClient {
    /// Wrap a selected connection, resolving local addresses from the host's interfaces
    pub fn new(connection: BoxedConnection) -> Self {
        Self::with_interfaces(connection, SystemInterfaces)
    }

    /// Wrap a selected connection with a custom interface source
    pub fn with_interfaces(connection: BoxedConnection, interfaces: impl InterfaceSource + 'static) -> Self {
        Self {
            connection,
            interfaces: Box::new(interfaces),
            local_ip: None,
        }
    }

    /// Service variant of the selected connection
    pub fn variant(&self) -> ServiceVariant {
        self.connection.variant()
    }

    /// Host part of the router's base URL
    pub fn control_host(&self) -> Option<&str> {
        self.connection.url_base().host_str()
    }

    /// Local address on the router's subnet, resolved once and then cached
    pub fn local_ip(&mut self) -> Result<IpAddr, RouterError> {
        if let Some(ip) = self.local_ip {
            return Ok(ip);
        }

        let ip = resolve_local_ip(self.connection.url_base(), self.interfaces.as_ref())?;
        self.local_ip = Some(ip);
        Ok(ip)
    }

    /// The router's external (WAN) address
    pub async fn get_external_ip_address(&self) -> Result<String, RouterError> {
        self.connection
            .get_external_ip_address()
            .await
            .map_err(RouterError::ExternalIp)
    }

    /// Forward `port` (external = internal) on TCP then UDP to the local address
    ///
    /// Not atomic: if the UDP mapping fails the TCP mapping stays in place,
    /// and if the TCP mapping fails UDP is never attempted.
    pub async fn forward(&mut self, port: u16, description: &str) -> Result<(), RouterError> {
        let local_ip = self.local_ip()?;

        for protocol in PortMappingProtocol::BOTH {
            info!("Forwarding port {} on {}...", port, protocol);

            let request = PortMappingRequest {
                remote_host: String::new(),
                external_port: port,
                protocol,
                internal_port: port,
                internal_client: local_ip.to_string(),
                enabled: true,
                description: description.to_string(),
                lease_duration: LEASE_DURATION,
            };

            self.connection
                .add_port_mapping(&request)
                .await
                .map_err(|source| RouterError::RemoteMapping {
                    operation: MappingOperation::Add,
                    port,
                    protocol,
                    source,
                })?;
        }

        Ok(())
    }

    /// Delete the TCP then UDP mappings of `port`
    ///
    /// Same fail-fast semantics as [`forward`](Self::forward). A missing
    /// mapping is reported by the device and surfaced as an error.
    pub async fn clear(&self, port: u16) -> Result<(), RouterError> {
        for protocol in PortMappingProtocol::BOTH {
            info!("Clearing port {} on {}...", port, protocol);

            self.connection
                .delete_port_mapping("", port, protocol)
                .await
                .map_err(|source| RouterError::RemoteMapping {
                    operation: MappingOperation::Delete,
                    port,
                    protocol,
                    source,
                })?;
        }

        Ok(())
    }

    /// The router's current mapping of `port`/`protocol`
    pub async fn mapping_entry(
        &self,
        port: u16,
        protocol: PortMappingProtocol,
    ) -> Result<PortMappingEntry, RouterError> {
        self.connection
            .get_specific_port_mapping_entry("", port, protocol)
            .await
            .map_err(|source| RouterError::RemoteMapping {
                operation: MappingOperation::Query,
                port,
                protocol,
                source,
            })
    }
}

impl fmt::Debug for RouterClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterClient")
            .field("connection", &self.connection)
            .field("local_ip", &self.local_ip)
            .finish_non_exhaustive()
    }
}
