//! Typed clients, one per WAN connection service variant
//!
//! Each client discovers the devices implementing its own service type and
//! exposes the shared [`WanConnection`] operations on top of a
//! [`ServiceClient`].

use super::connection::{self, WanConnection};
use super::description::fetch_description;
use super::soap::ServiceClient;
use super::ssdp::{self, SearchOptions};
use super::types::{PortMappingEntry, PortMappingProtocol, PortMappingRequest, ServiceVariant, UpnpError};
use async_trait::async_trait;
use reqwest::Url;
use tracing::{debug, warn};

/// Outcome of discovering one service variant
///
/// `errors` holds per-device failures (unreachable or malformed device
/// descriptions); devices that failed contribute no clients.
#[derive(Debug)]
pub struct DiscoveryReport<T> {
    /// Clients for every matching service found
    pub clients: Vec<T>,
    /// Per-device failures
    pub errors: Vec<UpnpError>,
}

impl<T> DiscoveryReport<T> {
    /// Convert the clients, keeping the errors
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> DiscoveryReport<U> {
        DiscoveryReport {
            clients: self.clients.into_iter().map(f).collect(),
            errors: self.errors,
        }
    }
}

/// Discover every service instance of `variant` on the local network
pub async fn discover_services(
    variant: ServiceVariant,
    options: &SearchOptions,
) -> Result<DiscoveryReport<ServiceClient>, UpnpError> {
    let http = reqwest::Client::builder()
        .timeout(options.http_timeout)
        .no_proxy()
        .build()?;
    let responses = ssdp::search(variant.urn(), options).await?;

    let mut report = DiscoveryReport {
        clients: Vec::new(),
        errors: Vec::new(),
    };

    for response in responses {
        let location = match Url::parse(&response.location) {
            Ok(location) => location,
            Err(e) => {
                warn!("Ignoring device with invalid location '{}': {}", response.location, e);
                report.errors.push(UpnpError::InvalidResponse(format!(
                    "Invalid location '{}': {}",
                    response.location, e
                )));
                continue;
            }
        };

        let description = match fetch_description(&http, &location).await {
            Ok(description) => description,
            Err(e) => {
                warn!("Failed to read device description at {}: {}", location, e);
                report.errors.push(e);
                continue;
            }
        };

        for service in description.services_of(variant) {
            debug!("Found {} service at {}", variant, service.control_url);
            report.clients.push(ServiceClient::new(
                http.clone(),
                variant,
                description.url_base.clone(),
                service.control_url.clone(),
            ));
        }
    }

    Ok(report)
}

macro_rules! wan_connection_client {
    ($(#[$meta:meta])* $name:ident, $variant:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            service: ServiceClient,
        }

        impl $name {
            /// Discover every device on the network implementing this service
            pub async fn discover(options: &SearchOptions) -> Result<DiscoveryReport<Self>, UpnpError> {
                let report = discover_services($variant, options).await?;
                Ok(report.map(|service| Self { service }))
            }

            /// Wrap a service client, which must speak this variant
            pub fn from_service(service: ServiceClient) -> Option<Self> {
                (service.variant() == $variant).then(|| Self { service })
            }

            /// Underlying SOAP client
            pub fn service_client(&self) -> &ServiceClient {
                &self.service
            }
        }

        #[async_trait]
        impl WanConnection for $name {
            fn variant(&self) -> ServiceVariant {
                $variant
            }

            fn url_base(&self) -> &Url {
                self.service.url_base()
            }

            async fn get_external_ip_address(&self) -> Result<String, UpnpError> {
                connection::get_external_ip_address(&self.service).await
            }

            async fn add_port_mapping(&self, request: &PortMappingRequest) -> Result<(), UpnpError> {
                connection::add_port_mapping(&self.service, request).await
            }

            async fn delete_port_mapping(
                &self,
                remote_host: &str,
                external_port: u16,
                protocol: PortMappingProtocol,
            ) -> Result<(), UpnpError> {
                connection::delete_port_mapping(&self.service, remote_host, external_port, protocol).await
            }

            async fn get_specific_port_mapping_entry(
                &self,
                remote_host: &str,
                external_port: u16,
                protocol: PortMappingProtocol,
            ) -> Result<PortMappingEntry, UpnpError> {
                connection::get_specific_port_mapping_entry(&self.service, remote_host, external_port, protocol)
                    .await
            }
        }
    };
}

wan_connection_client!(
    /// Client for `WANIPConnection:1`
    WanIpConnection1Client,
    ServiceVariant::WanIpConnection1
);

wan_connection_client!(
    /// Client for `WANIPConnection:2`
    WanIpConnection2Client,
    ServiceVariant::WanIpConnection2
);

wan_connection_client!(
    /// Client for `WANPPPConnection:1`, found on DSL-style gateways
    WanPppConnection1Client,
    ServiceVariant::WanPppConnection1
);
