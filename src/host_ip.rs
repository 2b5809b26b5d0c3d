//! Selection of the host address embedded in container URLs.
//!
//! Without network calls, pick the IPv4 address a browser on the LAN would
//! most likely use to reach published container ports. Precedence:
//!
//! 1. an explicitly configured override,
//! 2. when running inside a container, the engine's host alias,
//! 3. the first private-LAN address of an up, non-loopback interface,
//! 4. `127.0.0.1`.

use std::collections::HashMap;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddrV4, SocketAddrV6};
use std::time::Duration;

use nix::ifaddrs::getifaddrs;
use nix::net::if_::InterfaceFlags;
use tracing::{debug, warn};

pub const DEFAULT_HOST_ALIAS: &str = "host.docker.internal";

const ALIAS_LOOKUP_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressClass {
    Loopback,
    /// 172.17.0.0/16 and 172.18.0.0/16, the engine's default and first
    /// user-defined bridge networks.
    DockerBridge,
    /// 192.168.0.0/16 and 10.0.0.0/8.
    PrivateLan,
    Other,
}

pub fn classify(ip: Ipv4Addr) -> AddressClass {
    match ip.octets() {
        [127, ..] => AddressClass::Loopback,
        [172, 17 | 18, ..] => AddressClass::DockerBridge,
        [192, 168, ..] | [10, ..] => AddressClass::PrivateLan,
        _ => AddressClass::Other,
    }
}

/// A host network interface and its addresses, in enumeration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    pub name: String,
    pub up: bool,
    pub loopback: bool,
    pub addrs: Vec<IpAddr>,
}

#[derive(Debug, Clone)]
pub struct HostIpConfig {
    pub override_ip: Option<Ipv4Addr>,
    pub running_in_docker: bool,
    pub host_alias: String,
}

impl Default for HostIpConfig {
    fn default() -> Self {
        Self {
            override_ip: None,
            running_in_docker: false,
            host_alias: DEFAULT_HOST_ALIAS.to_string(),
        }
    }
}

/// First private-LAN IPv4 address of an up, non-loopback interface, or
/// loopback when there is none. Bridge addresses are never returned.
pub fn select_from_interfaces(interfaces: &[Interface]) -> Ipv4Addr {
    interfaces
        .iter()
        .filter(|iface| iface.up && !iface.loopback)
        .flat_map(|iface| iface.addrs.iter())
        .filter_map(|addr| match addr {
            IpAddr::V4(v4) => Some(*v4),
            IpAddr::V6(_) => None,
        })
        .find(|v4| classify(*v4) == AddressClass::PrivateLan)
        .unwrap_or(Ipv4Addr::LOCALHOST)
}

/// Enumerate the host's interfaces with `getifaddrs(3)`.
pub fn list_interfaces() -> io::Result<Vec<Interface>> {
    let mut interfaces: Vec<Interface> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for entry in getifaddrs().map_err(io::Error::from)? {
        let slot = *index.entry(entry.interface_name.clone()).or_insert_with(|| {
            interfaces.push(Interface {
                name: entry.interface_name.clone(),
                up: entry.flags.contains(InterfaceFlags::IFF_UP),
                loopback: entry.flags.contains(InterfaceFlags::IFF_LOOPBACK),
                addrs: Vec::new(),
            });
            interfaces.len() - 1
        });

        let Some(storage) = entry.address else {
            continue;
        };
        if let Some(sin) = storage.as_sockaddr_in() {
            interfaces[slot]
                .addrs
                .push(IpAddr::V4(*SocketAddrV4::from(*sin).ip()));
        } else if let Some(sin6) = storage.as_sockaddr_in6() {
            interfaces[slot]
                .addrs
                .push(IpAddr::V6(*SocketAddrV6::from(*sin6).ip()));
        }
    }

    Ok(interfaces)
}

/// Resolve the host part of container URLs for one listing.
pub async fn resolve_host_ip(config: &HostIpConfig) -> String {
    resolve_host_ip_with(config, list_interfaces).await
}

/// Same as [`resolve_host_ip`] with a caller-supplied interface source.
pub async fn resolve_host_ip_with<F>(config: &HostIpConfig, enumerate: F) -> String
where
    F: FnOnce() -> io::Result<Vec<Interface>>,
{
    if let Some(ip) = config.override_ip {
        debug!("using configured host IP {}", ip);
        return ip.to_string();
    }

    if config.running_in_docker {
        if let Some(ip) = lookup_alias(&config.host_alias).await {
            debug!("resolved {} to {}", config.host_alias, ip);
            return ip.to_string();
        }
    }

    match enumerate() {
        Ok(interfaces) => select_from_interfaces(&interfaces).to_string(),
        Err(e) => {
            warn!("cannot enumerate network interfaces, using loopback: {}", e);
            Ipv4Addr::LOCALHOST.to_string()
        }
    }
}

async fn lookup_alias(host: &str) -> Option<Ipv4Addr> {
    let lookup = tokio::net::lookup_host((host, 0));
    match tokio::time::timeout(ALIAS_LOOKUP_TIMEOUT, lookup).await {
        Ok(Ok(addrs)) => addrs.into_iter().find_map(|addr| match addr.ip() {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(_) => None,
        }),
        Ok(Err(e)) => {
            debug!("lookup of {} failed: {}", host, e);
            None
        }
        Err(_) => {
            debug!("lookup of {} timed out", host);
            None
        }
    }
}
