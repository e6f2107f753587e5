//! Network endpoints as they appear on the wire.
//!
//! The wire form is a 16-byte IPv6 address and a 2-byte port. IPv4 addresses
//! travel in IPv4-mapped form. [`Endpoint`] holds exactly those two fields,
//! so a decoded endpoint always equals the one that was encoded.
//! Conversion from a [`SocketAddr`] drops the IPv6 flow label and scope id,
//! which have no wire form.

use std::fmt;
use std::net::{IpAddr, Ipv6Addr, SocketAddr};

/// An IP address and port, stored in its 18-byte wire shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Endpoint {
    ip: Ipv6Addr,
    port: u16,
}

impl Endpoint {
    /// Build an endpoint; IPv4 addresses are stored IPv4-mapped
    pub fn new(ip: IpAddr, port: u16) -> Self {
        let ip = match ip {
            IpAddr::V4(v4) => v4.to_ipv6_mapped(),
            IpAddr::V6(v6) => v6,
        };
        Self { ip, port }
    }

    /// The address exactly as carried on the wire
    pub fn ip(&self) -> Ipv6Addr {
        self.ip
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// The address with IPv4-mapped values unwrapped to IPv4
    pub fn to_ip_addr(&self) -> IpAddr {
        match self.ip.to_ipv4_mapped() {
            Some(v4) => IpAddr::V4(v4),
            None => IpAddr::V6(self.ip),
        }
    }

    pub fn to_socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.to_ip_addr(), self.port)
    }

    pub(crate) fn from_wire(octets: [u8; 16], port: u16) -> Self {
        Self {
            ip: Ipv6Addr::from(octets),
            port,
        }
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            ip: Ipv6Addr::UNSPECIFIED,
            port: 0,
        }
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr.ip(), addr.port())
    }
}

impl From<Endpoint> for SocketAddr {
    fn from(endpoint: Endpoint) -> Self {
        endpoint.to_socket_addr()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_socket_addr(), f)
    }
}
