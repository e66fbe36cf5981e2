//! SOAP action invocation against a service control URL

use super::description::{element_text, parse_document};
use super::types::{ServiceVariant, UpnpError};
use reqwest::Url;
use std::collections::HashMap;
use tracing::debug;
use xmltree::{Element, XMLNode};

/// Client for one service instance on one device
#[derive(Debug, Clone)]
pub struct ServiceClient {
    http: reqwest::Client,
    variant: ServiceVariant,
    url_base: Url,
    control_url: Url,
}

impl ServiceClient {
    /// Create a client for the service of type `variant` at `control_url`
    pub fn new(http: reqwest::Client, variant: ServiceVariant, url_base: Url, control_url: Url) -> Self {
        Self {
            http,
            variant,
            url_base,
            control_url,
        }
    }

    /// Service variant this client speaks
    pub fn variant(&self) -> ServiceVariant {
        self.variant
    }

    /// Base URL of the root device hosting the service
    pub fn url_base(&self) -> &Url {
        &self.url_base
    }

    /// Control URL actions are posted to
    pub fn control_url(&self) -> &Url {
        &self.control_url
    }

    /// Invoke `action` with `args` and return the response arguments
    pub async fn perform_action(
        &self,
        action: &str,
        args: &[(&str, String)],
    ) -> Result<HashMap<String, String>, UpnpError> {
        let service_type = self.variant.urn();
        let envelope = build_envelope(service_type, action, args);

        debug!("SOAP {}#{} -> {}", self.variant, action, self.control_url);

        let response = self
            .http
            .post(self.control_url.clone())
            .header("Content-Type", "text/xml; charset=\"utf-8\"")
            .header("SOAPAction", format!("\"{}#{}\"", service_type, action))
            .body(envelope)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(parse_fault(&body).unwrap_or(UpnpError::HttpStatus {
                action: action.to_string(),
                status: status.as_u16(),
            }));
        }

        parse_action_response(&body, action)
    }
}

/// Build the SOAP 1.1 envelope for an action call
pub fn build_envelope(service_type: &str, action: &str, args: &[(&str, String)]) -> String {
    let mut arguments = String::new();
    for (name, value) in args {
        arguments.push_str(&format!("<{name}>{}</{name}>", escape_xml(value)));
    }

    format!(
        "<?xml version=\"1.0\"?>\
         <s:Envelope xmlns:s=\"http://schemas.xmlsoap.org/soap/envelope/\" \
         s:encodingStyle=\"http://schemas.xmlsoap.org/soap/encoding/\">\
         <s:Body>\
         <u:{action} xmlns:u=\"{service_type}\">{arguments}</u:{action}>\
         </s:Body>\
         </s:Envelope>"
    )
}

/// Extract the output arguments of `<action>Response`
pub fn parse_action_response(body: &str, action: &str) -> Result<HashMap<String, String>, UpnpError> {
    let envelope = parse_document(body.as_bytes())?;
    let soap_body = envelope
        .get_child("Body")
        .ok_or_else(|| UpnpError::InvalidResponse("SOAP envelope has no Body".to_string()))?;

    if let Some(fault) = fault_from_body(soap_body) {
        return Err(fault);
    }

    let expected = format!("{}Response", action);
    let response = soap_body.get_child(expected.as_str()).ok_or_else(|| {
        UpnpError::InvalidResponse(format!("SOAP Body has no {} element", expected))
    })?;

    Ok(response
        .children
        .iter()
        .filter_map(|node| match node {
            XMLNode::Element(arg) => Some((
                arg.name.clone(),
                arg.get_text().map(|t| t.trim().to_string()).unwrap_or_default(),
            )),
            _ => None,
        })
        .collect())
}

/// Parse a SOAP fault carrying a `UPnPError`
pub fn parse_fault(body: &str) -> Option<UpnpError> {
    let envelope = parse_document(body.as_bytes()).ok()?;
    fault_from_body(envelope.get_child("Body")?)
}

fn fault_from_body(soap_body: &Element) -> Option<UpnpError> {
    let fault = soap_body.get_child("Fault")?;

    let upnp_error = fault
        .get_child("detail")
        .and_then(|detail| detail.get_child("UPnPError"));

    let Some(upnp_error) = upnp_error else {
        let description = element_text(fault, "faultstring").unwrap_or_else(|| "Unknown fault".to_string());
        return Some(UpnpError::InvalidResponse(format!("SOAP fault: {}", description)));
    };

    let code = element_text(upnp_error, "errorCode")
        .and_then(|code| code.parse().ok())
        .unwrap_or(0);
    let description = element_text(upnp_error, "errorDescription").unwrap_or_default();

    Some(UpnpError::Soap { code, description })
}

/// Escape the five XML special characters
pub fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
