//! network values: ip networks and socket addresses
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    pub fn of(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => IpVersion::V4,
            IpAddr::V6(_) => IpVersion::V6,
        }
    }

    fn max_prefix(self) -> u8 {
        match self {
            IpVersion::V4 => 32,
            IpVersion::V6 => 128,
        }
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpVersion::V4 => f.write_str("IPv4"),
            IpVersion::V6 => f.write_str("IPv6"),
        }
    }
}

/// An address with a prefix length, `10.0.0.0/8` or `fe80::/10`
///
/// Host bits are kept as written, use [IpNetwork::network] for the masked address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IpNetwork {
    pub addr: IpAddr,
    pub prefix: u8,
}

impl IpNetwork {
    pub fn version(&self) -> IpVersion {
        IpVersion::of(&self.addr)
    }

    pub fn network(&self) -> IpAddr {
        match self.addr {
            IpAddr::V4(addr) => {
                let mask = u32::MAX.checked_shl(32 - self.prefix as u32).unwrap_or(0);
                IpAddr::V4(Ipv4Addr::from(u32::from(addr) & mask))
            }
            IpAddr::V6(addr) => {
                let mask = u128::MAX.checked_shl(128 - self.prefix as u32).unwrap_or(0);
                IpAddr::V6(Ipv6Addr::from(u128::from(addr) & mask))
            }
        }
    }

    pub fn contains(&self, addr: &IpAddr) -> bool {
        if IpVersion::of(addr) != self.version() {
            return false;
        }
        IpNetwork {
            addr: *addr,
            prefix: self.prefix,
        }
        .network()
            == self.network()
    }
}

impl FromStr for IpNetwork {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, prefix) = match s.split_once('/') {
            Some((addr, prefix)) => (addr, Some(prefix)),
            None => (s, None),
        };

        let addr: IpAddr = addr.parse().map_err(|err| format!("{err}"))?;
        let max_prefix = IpVersion::of(&addr).max_prefix();
        let prefix = match prefix {
            None => max_prefix,
            Some(prefix) => prefix
                .parse::<u8>()
                .ok()
                .filter(|prefix| *prefix <= max_prefix)
                .ok_or_else(|| format!("invalid prefix length {prefix:?}"))?,
        };

        Ok(IpNetwork { addr, prefix })
    }
}

impl fmt::Display for IpNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Host {
    Ip(IpAddr),
    Name(String),
}

impl Host {
    pub fn parse(s: &str) -> Result<Self, String> {
        match url::Host::parse(s).map_err(|err| err.to_string())? {
            url::Host::Ipv4(addr) => Ok(Host::Ip(IpAddr::V4(addr))),
            url::Host::Ipv6(addr) => Ok(Host::Ip(IpAddr::V6(addr))),
            url::Host::Domain(name) => Ok(Host::Name(name)),
        }
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Host::Ip(IpAddr::V6(addr)) => write!(f, "[{addr}]"),
            Host::Ip(addr) => addr.fmt(f),
            Host::Name(name) => f.write_str(name),
        }
    }
}

/// `host:port` where host is an ip address or a host name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SocketAddress {
    pub host: Host,
    pub port: u16,
}

impl SocketAddress {
    /// Parse `host:port`, `[v6]:port`, `host`, `:port`, or a bare IPv6 address
    ///
    /// Missing parts are taken from the defaults. Ports must be in `1..=65535`.
    pub fn parse(
        s: &str,
        default_host: Option<&Host>,
        default_port: Option<u16>,
    ) -> Result<Self, String> {
        let (raw_host, raw_port) = if let Some(rest) = s.strip_prefix('[') {
            let (host, after) = rest
                .split_once(']')
                .ok_or_else(|| "missing closing bracket".to_string())?;
            match after {
                "" => (host, None),
                after => match after.strip_prefix(':') {
                    Some(port) => (host, Some(port)),
                    None => return Err(format!("unexpected {after:?} after address")),
                },
            }
        } else if s.matches(':').count() > 1 {
            (s, None)
        } else {
            match s.split_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (s, None),
            }
        };

        let host = match raw_host {
            "" => default_host
                .cloned()
                .ok_or_else(|| "you must specify a host".to_string())?,
            raw_host if raw_host.contains(':') => Host::Ip(IpAddr::V6(
                raw_host.parse().map_err(|err| format!("{err}"))?,
            )),
            raw_host => Host::parse(raw_host)?,
        };

        let port = match raw_port.filter(|port| !port.is_empty()) {
            None => default_port.ok_or_else(|| "you must specify a port".to_string())?,
            Some(raw_port) => {
                let port: u32 = raw_port
                    .parse()
                    .map_err(|_| format!("{raw_port:?} is not a port (not an integer)"))?;
                u16::try_from(port)
                    .ok()
                    .filter(|port| *port >= 1)
                    .ok_or_else(|| format!("{port} is not a port (not in 1 - 65535 range)"))?
            }
        };

        Ok(SocketAddress { host, port })
    }
}

impl fmt::Display for SocketAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
