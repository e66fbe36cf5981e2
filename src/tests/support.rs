// Shared test doubles for the router and keep tests

use crate::igd::{
    BoxedConnection, DeviceFinder, PortMappingEntry, PortMappingProtocol, PortMappingRequest,
    ServiceVariant, UpnpError, WanConnection,
};
use crate::router::{InterfaceAddr, InterfaceSource};
use async_trait::async_trait;
use reqwest::Url;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A remote call seen by [`MockConnection`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ExternalIp,
    Add(PortMappingRequest),
    Delete {
        remote_host: String,
        port: u16,
        protocol: PortMappingProtocol,
    },
    Query {
        port: u16,
        protocol: PortMappingProtocol,
    },
}

pub fn conflict() -> UpnpError {
    UpnpError::Soap {
        code: 718,
        description: "ConflictInMappingEntry".to_string(),
    }
}

pub fn no_such_entry() -> UpnpError {
    UpnpError::Soap {
        code: 714,
        description: "NoSuchEntryInArray".to_string(),
    }
}

/// In-memory gateway connection that records every call
#[derive(Debug, Clone)]
pub struct MockConnection {
    variant: ServiceVariant,
    url_base: Url,
    calls: Arc<Mutex<Vec<Call>>>,
    fail_add: Option<PortMappingProtocol>,
    fail_delete: Option<PortMappingProtocol>,
}

impl MockConnection {
    pub fn new(variant: ServiceVariant, url_base: &str) -> Self {
        Self {
            variant,
            url_base: Url::parse(url_base).unwrap(),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_add: None,
            fail_delete: None,
        }
    }

    pub fn router() -> Self {
        Self::new(ServiceVariant::WanIpConnection1, "http://192.168.1.1:5000/")
    }

    pub fn failing_add(mut self, protocol: PortMappingProtocol) -> Self {
        self.fail_add = Some(protocol);
        self
    }

    pub fn failing_delete(mut self, protocol: PortMappingProtocol) -> Self {
        self.fail_delete = Some(protocol);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn boxed(&self) -> BoxedConnection {
        Box::new(self.clone())
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl WanConnection for MockConnection {
    fn variant(&self) -> ServiceVariant {
        self.variant
    }

    fn url_base(&self) -> &Url {
        &self.url_base
    }

    async fn get_external_ip_address(&self) -> Result<String, UpnpError> {
        self.record(Call::ExternalIp);
        Ok("203.0.113.7".to_string())
    }

    async fn add_port_mapping(&self, request: &PortMappingRequest) -> Result<(), UpnpError> {
        self.record(Call::Add(request.clone()));
        if self.fail_add == Some(request.protocol) {
            return Err(conflict());
        }
        Ok(())
    }

    async fn delete_port_mapping(
        &self,
        remote_host: &str,
        external_port: u16,
        protocol: PortMappingProtocol,
    ) -> Result<(), UpnpError> {
        self.record(Call::Delete {
            remote_host: remote_host.to_string(),
            port: external_port,
            protocol,
        });
        if self.fail_delete == Some(protocol) {
            return Err(no_such_entry());
        }
        Ok(())
    }

    async fn get_specific_port_mapping_entry(
        &self,
        _remote_host: &str,
        external_port: u16,
        protocol: PortMappingProtocol,
    ) -> Result<PortMappingEntry, UpnpError> {
        self.record(Call::Query {
            port: external_port,
            protocol,
        });
        Ok(PortMappingEntry {
            internal_port: external_port,
            internal_client: "192.168.1.50".to_string(),
            enabled: true,
            description: "mock".to_string(),
            lease_duration: 0,
        })
    }
}

/// What [`MockFinder`] answers for one variant
#[derive(Debug, Clone)]
pub enum Slot {
    /// One device per base URL
    Devices(Vec<&'static str>),
    /// Enumeration error
    Fail,
    /// Never completes
    Hang,
}

/// Device finder with canned per-variant answers
#[derive(Debug)]
pub struct MockFinder {
    ip2: Slot,
    ip1: Slot,
    ppp1: Slot,
    started: AtomicUsize,
}

impl MockFinder {
    pub fn new(ip2: Slot, ip1: Slot, ppp1: Slot) -> Self {
        Self {
            ip2,
            ip1,
            ppp1,
            started: AtomicUsize::new(0),
        }
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeviceFinder for MockFinder {
    async fn find(&self, variant: ServiceVariant) -> Result<Vec<BoxedConnection>, UpnpError> {
        self.started.fetch_add(1, Ordering::SeqCst);

        let slot = match variant {
            ServiceVariant::WanIpConnection2 => &self.ip2,
            ServiceVariant::WanIpConnection1 => &self.ip1,
            ServiceVariant::WanPppConnection1 => &self.ppp1,
        };

        match slot {
            Slot::Devices(urls) => Ok(urls
                .iter()
                .map(|url| MockConnection::new(variant, url).boxed())
                .collect()),
            Slot::Fail => Err(UpnpError::InvalidResponse("malformed description".to_string())),
            Slot::Hang => std::future::pending().await,
        }
    }
}

/// Fixed interface list that counts how often it is read
#[derive(Debug, Clone)]
pub struct StaticInterfaces {
    addrs: Vec<InterfaceAddr>,
    reads: Arc<AtomicUsize>,
}

impl StaticInterfaces {
    pub fn new(addrs: Vec<InterfaceAddr>) -> Self {
        Self {
            addrs,
            reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A single `eth0` interface with `ip/prefix_len`
    pub fn single(ip: &str, prefix_len: u8) -> Self {
        let ip: IpAddr = ip.parse().unwrap();
        Self::new(vec![InterfaceAddr::with_prefix("eth0", ip, prefix_len)])
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl InterfaceSource for StaticInterfaces {
    fn interfaces(&self) -> std::io::Result<Vec<InterfaceAddr>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.addrs.clone())
    }
}
