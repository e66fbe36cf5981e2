//! SSDP (Simple Service Discovery Protocol) search
//!
//! A single `M-SEARCH` is multicast for one search target; every unicast
//! `HTTP/1.1 200` reply received before the deadline contributes its
//! `LOCATION` header (the device description URL).

use super::types::UpnpError;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, trace};

/// SSDP multicast group and port
pub const SSDP_MULTICAST_ADDR: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(239, 255, 255, 250)), 1900);

/// Default time to wait for search replies
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(3);

/// Default timeout for description and SOAP requests
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(5);

/// Options for device discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    /// Local address the search socket binds to
    pub bind_addr: SocketAddr,
    /// How long to collect search replies
    pub timeout: Duration,
    /// Timeout applied to every HTTP request made for discovered devices
    pub http_timeout: Duration,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            timeout: DEFAULT_SEARCH_TIMEOUT,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

/// A parsed search reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResponse {
    /// Device description URL
    pub location: String,
    /// Search target echoed by the device
    pub search_target: Option<String>,
    /// Unique service name
    pub usn: Option<String>,
}

/// Build an `M-SEARCH` request for `search_target`
pub fn build_search_request(search_target: &str, timeout: Duration) -> String {
    // MX must be at least 1 and devices are told to answer within it
    let mx = timeout.as_secs().clamp(1, 5);
    format!(
        "M-SEARCH * HTTP/1.1\r\n\
         HOST: {}\r\n\
         MAN: \"ssdp:discover\"\r\n\
         MX: {}\r\n\
         ST: {}\r\n\
         \r\n",
        SSDP_MULTICAST_ADDR, mx, search_target
    )
}

/// Parse a search reply datagram
///
/// Returns `None` for anything that is not a `200` reply carrying a
/// `LOCATION` header. Header names are matched case-insensitively.
pub fn parse_search_response(datagram: &str) -> Option<SearchResponse> {
    let mut lines = datagram.lines();
    let status = lines.next()?.trim();
    let mut parts = status.split_whitespace();
    if !parts.next()?.starts_with("HTTP/") || parts.next()? != "200" {
        return None;
    }

    let mut location = None;
    let mut search_target = None;
    let mut usn = None;

    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim().to_string();
        match name.trim().to_ascii_lowercase().as_str() {
            "location" => location = Some(value),
            "st" => search_target = Some(value),
            "usn" => usn = Some(value),
            _ => {}
        }
    }

    Some(SearchResponse {
        location: location.filter(|l| !l.is_empty())?,
        search_target,
        usn,
    })
}

/// Add the reply in `datagram` to `found` and return its location
///
/// Unparseable datagrams, replies whose `ST` differs from `search_target`
/// and locations already in `found` are dropped. A reply without `ST` is
/// kept.
pub fn record_reply<'a>(
    found: &'a mut Vec<SearchResponse>,
    datagram: &str,
    search_target: &str,
) -> Option<&'a str> {
    let response = parse_search_response(datagram)?;

    if response
        .search_target
        .as_deref()
        .is_some_and(|st| st != search_target)
    {
        return None;
    }

    if found.iter().any(|r| r.location == response.location) {
        return None;
    }

    found.push(response);
    found.last().map(|r| r.location.as_str())
}

/// Search the local network for devices answering `search_target`
///
/// Replies whose `ST` differs from the requested target are ignored, and
/// each location is reported once.
pub async fn search(
    search_target: &str,
    options: &SearchOptions,
) -> Result<Vec<SearchResponse>, UpnpError> {
    let socket = UdpSocket::bind(options.bind_addr).await?;
    let request = build_search_request(search_target, options.timeout);

    debug!("SSDP search for {} from {}", search_target, options.bind_addr);
    socket.send_to(request.as_bytes(), SSDP_MULTICAST_ADDR).await?;

    let deadline = Instant::now() + options.timeout;
    let mut buf = vec![0u8; 2048];
    let mut found: Vec<SearchResponse> = Vec::new();

    loop {
        let (len, from) = match timeout_at(deadline, socket.recv_from(&mut buf)).await {
            Ok(received) => received?,
            Err(_) => break,
        };

        let datagram = String::from_utf8_lossy(&buf[..len]);
        if let Some(location) = record_reply(&mut found, &datagram, search_target) {
            debug!("SSDP reply from {}: {}", from, location);
        } else {
            trace!("Ignoring SSDP datagram from {}", from);
        }
    }

    debug!("SSDP search for {} found {} device(s)", search_target, found.len());
    Ok(found)
}
