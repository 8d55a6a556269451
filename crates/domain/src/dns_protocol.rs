use crate::errors::DomainError;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;

pub const DEFAULT_DNS_PORT: u16 = 53;
pub const DEFAULT_DOT_PORT: u16 = 853;

/// A configured name server together with the transport used to reach it.
///
/// Accepted forms: `IP`, `IP:PORT`, `[IPv6]:PORT`, optionally prefixed with
/// `udp://`, `tcp://` or `tls://`. TLS endpoints may name the certificate
/// identity with a `#hostname` suffix (`tls://1.1.1.1#cloudflare-dns.com`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DnsProtocol {
    /// UDP first, TCP when the answer does not fit a datagram.
    Auto { addr: SocketAddr },
    Udp { addr: SocketAddr },
    Tcp { addr: SocketAddr },
    Tls { addr: SocketAddr, hostname: Arc<str> },
}

impl DnsProtocol {
    pub fn socket_addr(&self) -> SocketAddr {
        match self {
            DnsProtocol::Auto { addr }
            | DnsProtocol::Udp { addr }
            | DnsProtocol::Tcp { addr }
            | DnsProtocol::Tls { addr, .. } => *addr,
        }
    }

    pub fn hostname(&self) -> Option<&str> {
        match self {
            DnsProtocol::Tls { hostname, .. } => Some(hostname),
            _ => None,
        }
    }

    pub fn protocol_name(&self) -> &'static str {
        match self {
            DnsProtocol::Auto { .. } => "UDP+TCP",
            DnsProtocol::Udp { .. } => "UDP",
            DnsProtocol::Tcp { .. } => "TCP",
            DnsProtocol::Tls { .. } => "TLS",
        }
    }
}

/// Parses `host[:port]` where host must be an IP literal; IPv6 with a port
/// has to be bracketed.
pub fn parse_server_addr(s: &str, default_port: u16) -> Result<SocketAddr, DomainError> {
    let invalid = || DomainError::InvalidServerAddress(format!("'{}' is not IP[:PORT]", s));

    if let Ok(addr) = s.parse::<SocketAddr>() {
        return Ok(addr);
    }
    if let Ok(ip) = s.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, default_port));
    }
    if let Some(inner) = s.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
        let ip = inner.parse::<IpAddr>().map_err(|_| invalid())?;
        return Ok(SocketAddr::new(ip, default_port));
    }
    Err(invalid())
}

impl FromStr for DnsProtocol {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(rest) = s.strip_prefix("udp://") {
            return Ok(DnsProtocol::Udp {
                addr: parse_server_addr(rest, DEFAULT_DNS_PORT)?,
            });
        }
        if let Some(rest) = s.strip_prefix("tcp://") {
            return Ok(DnsProtocol::Tcp {
                addr: parse_server_addr(rest, DEFAULT_DNS_PORT)?,
            });
        }
        if let Some(rest) = s.strip_prefix("tls://") {
            let (addr_part, hostname) = match rest.split_once('#') {
                Some((addr, host)) if !host.is_empty() => (addr, Some(host)),
                Some(_) => {
                    return Err(DomainError::InvalidServerAddress(format!(
                        "empty TLS hostname in '{}'",
                        s
                    )))
                }
                None => (rest, None),
            };
            let addr = parse_server_addr(addr_part, DEFAULT_DOT_PORT)?;
            let hostname: Arc<str> = match hostname {
                Some(host) => host.into(),
                None => addr.ip().to_string().into(),
            };
            return Ok(DnsProtocol::Tls { addr, hostname });
        }
        if s.contains("://") {
            return Err(DomainError::InvalidServerAddress(format!(
                "unsupported scheme in '{}'. Expected udp://, tcp:// or tls://",
                s
            )));
        }
        Ok(DnsProtocol::Auto {
            addr: parse_server_addr(s, DEFAULT_DNS_PORT)?,
        })
    }
}

impl fmt::Display for DnsProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DnsProtocol::Auto { addr } => write!(f, "{}", addr),
            DnsProtocol::Udp { addr } => write!(f, "udp://{}", addr),
            DnsProtocol::Tcp { addr } => write!(f, "tcp://{}", addr),
            DnsProtocol::Tls { addr, hostname } => {
                if **hostname == addr.ip().to_string() {
                    write!(f, "tls://{}", addr)
                } else {
                    write!(f, "tls://{}#{}", addr, hostname)
                }
            }
        }
    }
}
