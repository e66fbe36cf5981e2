//! Local endpoint resolution
//!
//! The mapping target ("InternalClient") is the address of the local
//! interface whose subnet contains the router's LAN address.

use super::types::RouterError;
use reqwest::Url;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use tracing::debug;

/// An address assigned to a local network interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceAddr {
    /// Interface name (e.g. `eth0`)
    pub name: String,
    /// Assigned address
    pub ip: IpAddr,
    /// Subnet mask of the assigned range
    pub netmask: IpAddr,
}

impl InterfaceAddr {
    /// Build an interface address from a prefix length (`192.168.1.50/24`)
    pub fn with_prefix(name: impl Into<String>, ip: IpAddr, prefix_len: u8) -> Self {
        let netmask = match ip {
            IpAddr::V4(_) => {
                let bits = u32::MAX.checked_shl(32 - u32::from(prefix_len.min(32))).unwrap_or(0);
                IpAddr::V4(Ipv4Addr::from(bits))
            }
            IpAddr::V6(_) => {
                let bits = u128::MAX.checked_shl(128 - u32::from(prefix_len.min(128))).unwrap_or(0);
                IpAddr::V6(Ipv6Addr::from(bits))
            }
        };

        Self {
            name: name.into(),
            ip,
            netmask,
        }
    }

    /// Whether `other` lies in this address's subnet
    pub fn contains(&self, other: IpAddr) -> bool {
        match (self.ip, self.netmask, other) {
            (IpAddr::V4(ip), IpAddr::V4(mask), IpAddr::V4(other)) => {
                let mask = u32::from(mask);
                u32::from(ip) & mask == u32::from(other) & mask
            }
            (IpAddr::V6(ip), IpAddr::V6(mask), IpAddr::V6(other)) => {
                let mask = u128::from(mask);
                u128::from(ip) & mask == u128::from(other) & mask
            }
            _ => false,
        }
    }
}

/// Source of local interface addresses
pub trait InterfaceSource: Send + Sync {
    /// List every address assigned to a local interface
    fn interfaces(&self) -> std::io::Result<Vec<InterfaceAddr>>;
}

/// The host's interfaces, read through `get_if_addrs`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemInterfaces;

impl InterfaceSource for SystemInterfaces {
    fn interfaces(&self) -> std::io::Result<Vec<InterfaceAddr>> {
        let interfaces = get_if_addrs::get_if_addrs()?;

        Ok(interfaces
            .into_iter()
            .map(|iface| {
                let (ip, netmask) = match iface.addr {
                    get_if_addrs::IfAddr::V4(v4) => (IpAddr::V4(v4.ip), IpAddr::V4(v4.netmask)),
                    get_if_addrs::IfAddr::V6(v6) => (IpAddr::V6(v6.ip), IpAddr::V6(v6.netmask)),
                };
                InterfaceAddr {
                    name: iface.name,
                    ip,
                    netmask,
                }
            })
            .collect())
    }
}

/// The router's LAN address, taken from the host of its base URL
///
/// The host must be an IP literal; names are not resolved.
pub fn router_host_ip(url_base: &Url) -> Result<IpAddr, RouterError> {
    url_base
        .host_str()
        .map(|host| host.trim_start_matches('[').trim_end_matches(']'))
        .and_then(|host| host.parse().ok())
        .ok_or_else(|| RouterError::LocalIpResolution("couldn't determine router's internal ip".to_string()))
}

/// First local address whose subnet contains `router_ip`
pub fn find_local_ip(router_ip: IpAddr, interfaces: &[InterfaceAddr]) -> Option<IpAddr> {
    interfaces
        .iter()
        .find(|iface| iface.contains(router_ip))
        .map(|iface| {
            debug!("Router {} is reachable through {} ({})", router_ip, iface.name, iface.ip);
            iface.ip
        })
}

/// Resolve the local address to advertise as the mapping target
pub fn resolve_local_ip(url_base: &Url, source: &dyn InterfaceSource) -> Result<IpAddr, RouterError> {
    let router_ip = router_host_ip(url_base)?;

    let interfaces = source.interfaces().map_err(|e| {
        RouterError::LocalIpResolution(format!("couldn't list network interfaces: {}", e))
    })?;

    find_local_ip(router_ip, &interfaces)
        .ok_or_else(|| RouterError::LocalIpResolution("couldn't determine internal ip".to_string()))
}
