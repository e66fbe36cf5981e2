//! The capability shared by every WAN connection service variant

use super::soap::ServiceClient;
use super::types::{PortMappingEntry, PortMappingProtocol, PortMappingRequest, ServiceVariant, UpnpError};
use async_trait::async_trait;
use reqwest::Url;
use std::collections::HashMap;
use std::fmt;

/// Operations common to WANIPConnection:1, WANIPConnection:2 and WANPPPConnection:1
///
/// Everything above the client layer is written against this trait, so the
/// router selection and port mapping logic never branches on the variant.
#[async_trait]
pub trait WanConnection: Send + Sync + fmt::Debug {
    /// Service variant behind this handle
    fn variant(&self) -> ServiceVariant;

    /// Base URL of the root device (its host is the router's LAN address)
    fn url_base(&self) -> &Url;

    /// `GetExternalIPAddress`
    async fn get_external_ip_address(&self) -> Result<String, UpnpError>;

    /// `AddPortMapping`
    async fn add_port_mapping(&self, request: &PortMappingRequest) -> Result<(), UpnpError>;

    /// `DeletePortMapping`
    async fn delete_port_mapping(
        &self,
        remote_host: &str,
        external_port: u16,
        protocol: PortMappingProtocol,
    ) -> Result<(), UpnpError>;

    /// `GetSpecificPortMappingEntry`
    async fn get_specific_port_mapping_entry(
        &self,
        remote_host: &str,
        external_port: u16,
        protocol: PortMappingProtocol,
    ) -> Result<PortMappingEntry, UpnpError>;
}

/// A boxed connection handle of any variant
pub type BoxedConnection = Box<dyn WanConnection>;

pub(crate) async fn get_external_ip_address(service: &ServiceClient) -> Result<String, UpnpError> {
    let response = service.perform_action("GetExternalIPAddress", &[]).await?;
    required(&response, "NewExternalIPAddress").map(str::to_string)
}

pub(crate) async fn add_port_mapping(
    service: &ServiceClient,
    request: &PortMappingRequest,
) -> Result<(), UpnpError> {
    let args = [
        ("NewRemoteHost", request.remote_host.clone()),
        ("NewExternalPort", request.external_port.to_string()),
        ("NewProtocol", request.protocol.as_str().to_string()),
        ("NewInternalPort", request.internal_port.to_string()),
        ("NewInternalClient", request.internal_client.clone()),
        ("NewEnabled", bool_arg(request.enabled)),
        ("NewPortMappingDescription", request.description.clone()),
        ("NewLeaseDuration", request.lease_duration.to_string()),
    ];
    service.perform_action("AddPortMapping", &args).await?;
    Ok(())
}

pub(crate) async fn delete_port_mapping(
    service: &ServiceClient,
    remote_host: &str,
    external_port: u16,
    protocol: PortMappingProtocol,
) -> Result<(), UpnpError> {
    let args = [
        ("NewRemoteHost", remote_host.to_string()),
        ("NewExternalPort", external_port.to_string()),
        ("NewProtocol", protocol.as_str().to_string()),
    ];
    service.perform_action("DeletePortMapping", &args).await?;
    Ok(())
}

pub(crate) async fn get_specific_port_mapping_entry(
    service: &ServiceClient,
    remote_host: &str,
    external_port: u16,
    protocol: PortMappingProtocol,
) -> Result<PortMappingEntry, UpnpError> {
    let args = [
        ("NewRemoteHost", remote_host.to_string()),
        ("NewExternalPort", external_port.to_string()),
        ("NewProtocol", protocol.as_str().to_string()),
    ];
    let response = service.perform_action("GetSpecificPortMappingEntry", &args).await?;
    parse_port_mapping_entry(&response)
}

/// Build a [`PortMappingEntry`] from `GetSpecificPortMappingEntry` output arguments
pub fn parse_port_mapping_entry(response: &HashMap<String, String>) -> Result<PortMappingEntry, UpnpError> {
    Ok(PortMappingEntry {
        internal_port: parse_number(response, "NewInternalPort")?,
        internal_client: required(response, "NewInternalClient")?.to_string(),
        enabled: parse_bool(required(response, "NewEnabled")?)?,
        description: response
            .get("NewPortMappingDescription")
            .cloned()
            .unwrap_or_default(),
        lease_duration: parse_number(response, "NewLeaseDuration")?,
    })
}

fn required<'a>(response: &'a HashMap<String, String>, name: &str) -> Result<&'a str, UpnpError> {
    response
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| UpnpError::InvalidResponse(format!("Missing {} in response", name)))
}

fn parse_number<T: std::str::FromStr>(response: &HashMap<String, String>, name: &str) -> Result<T, UpnpError> {
    let value = required(response, name)?;
    value
        .parse()
        .map_err(|_| UpnpError::InvalidResponse(format!("Invalid {} '{}'", name, value)))
}

fn parse_bool(value: &str) -> Result<bool, UpnpError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(UpnpError::InvalidResponse(format!("Invalid boolean '{}'", other))),
    }
}

fn bool_arg(value: bool) -> String {
    if value { "1" } else { "0" }.to_string()
}
