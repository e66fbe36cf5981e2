//! Root device description parsing

use super::types::{ServiceVariant, UpnpError};
use reqwest::Url;
use xmltree::{Element, XMLNode};

/// A service advertised in a device description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescription {
    /// Service type URN
    pub service_type: String,
    /// Absolute control URL
    pub control_url: Url,
}

/// The parts of a root device description the client needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescription {
    /// Base URL of the root device (`URLBase`, or the description location)
    pub url_base: Url,
    /// Every service of the root device and its embedded devices
    pub services: Vec<ServiceDescription>,
}

impl DeviceDescription {
    /// Services implementing `variant`
    pub fn services_of(&self, variant: ServiceVariant) -> impl Iterator<Item = &ServiceDescription> {
        self.services
            .iter()
            .filter(move |service| service.service_type == variant.urn())
    }
}

/// Fetch and parse the description document at `location`
pub async fn fetch_description(
    http: &reqwest::Client,
    location: &Url,
) -> Result<DeviceDescription, UpnpError> {
    let response = http.get(location.clone()).send().await?.error_for_status()?;
    let body = response.bytes().await?;
    parse_description(&body, location)
}

/// Parse a root device description fetched from `location`
pub fn parse_description(xml: &[u8], location: &Url) -> Result<DeviceDescription, UpnpError> {
    let root = parse_document(xml)?;

    let url_base = match element_text(&root, "URLBase") {
        Some(base) if !base.is_empty() => Url::parse(&base).map_err(|e| {
            UpnpError::InvalidResponse(format!("Invalid URLBase '{}': {}", base, e))
        })?,
        _ => location.clone(),
    };

    let device = root
        .get_child("device")
        .ok_or_else(|| UpnpError::InvalidResponse("Description has no root device".to_string()))?;

    let mut services = Vec::new();
    collect_services(device, &url_base, &mut services)?;

    Ok(DeviceDescription { url_base, services })
}

fn collect_services(
    device: &Element,
    url_base: &Url,
    services: &mut Vec<ServiceDescription>,
) -> Result<(), UpnpError> {
    if let Some(service_list) = device.get_child("serviceList") {
        for service in child_elements(service_list, "service") {
            let (Some(service_type), Some(control_url)) = (
                element_text(service, "serviceType"),
                element_text(service, "controlURL"),
            ) else {
                continue;
            };

            let control_url = url_base.join(&control_url).map_err(|e| {
                UpnpError::InvalidResponse(format!("Invalid controlURL '{}': {}", control_url, e))
            })?;

            services.push(ServiceDescription {
                service_type,
                control_url,
            });
        }
    }

    if let Some(device_list) = device.get_child("deviceList") {
        for embedded in child_elements(device_list, "device") {
            collect_services(embedded, url_base, services)?;
        }
    }

    Ok(())
}

fn child_elements<'a>(parent: &'a Element, name: &'a str) -> impl Iterator<Item = &'a Element> {
    parent.children.iter().filter_map(move |node| match node {
        XMLNode::Element(element) if element.name == name => Some(element),
        _ => None,
    })
}

/// Parse an XML document, tolerating a byte order mark and leading whitespace
///
/// Some gateways send a blank line before the `<?xml` declaration, which
/// `xmltree` otherwise rejects.
pub(crate) fn parse_document(xml: &[u8]) -> Result<Element, UpnpError> {
    let xml = xml.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(xml);
    let start = xml
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(xml.len());
    Ok(Element::parse(&xml[start..])?)
}

pub(crate) fn element_text(parent: &Element, name: &str) -> Option<String> {
    parent
        .get_child(name)
        .map(|child| child.get_text().map(|t| t.trim().to_string()).unwrap_or_default())
}
