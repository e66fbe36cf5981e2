//! UPnP IGD (Internet Gateway Device) client
//!
//! This module talks to the gateway on the wire:
//! - SSDP search for a WAN connection service type
//! - Root device description fetch (HTTP + XML)
//! - SOAP action calls against a service control URL
//!
//! Three WAN connection service variants are supported (WANIPConnection:1,
//! WANIPConnection:2, WANPPPConnection:1). Each gets its own typed client and
//! all of them implement [`WanConnection`].

pub mod clients;
pub mod connection;
pub mod description;
pub mod finder;
pub mod soap;
pub mod ssdp;
pub mod types;

pub use clients::{
    DiscoveryReport, WanIpConnection1Client, WanIpConnection2Client, WanPppConnection1Client,
};
pub use connection::{BoxedConnection, WanConnection};
pub use finder::{DeviceFinder, SsdpDeviceFinder};
pub use soap::ServiceClient;
pub use ssdp::SearchOptions;
pub use types::{
    PortMappingEntry, PortMappingProtocol, PortMappingRequest, ServiceVariant, UpnpError,
};
