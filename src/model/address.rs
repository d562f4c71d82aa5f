//! IPv4 address ranges
//!
//! Rules can be scoped to a client address range expressed in CIDR notation.
//! Only IPv4 is supported: IPv6 input is rejected at parse time so that the
//! matching path never has to deal with it.

use crate::error::AddressError;
use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};

/// An IPv4 CIDR address range attached to a rule identifier
///
/// Containment is a bit-range test on the network prefix. Serialized as the
/// CIDR string (e.g. `192.168.0.0/16`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IpAddressRange {
    net: Ipv4Net,
}

impl IpAddressRange {
    /// Parse a CIDR string such as `10.0.0.0/8`
    ///
    /// A bare address is accepted as a /32 range. IPv6 input fails with
    /// [`AddressError::Ipv6Unsupported`].
    pub fn from_cidr(cidr: &str) -> Result<Self, AddressError> {
        if cidr.contains(':') {
            return Err(AddressError::Ipv6Unsupported(cidr.to_string()));
        }
        if let Ok(addr) = cidr.parse::<Ipv4Addr>() {
            // Bare address, treat as a single-host range
            let net = Ipv4Net::new(addr, 32).map_err(|e| AddressError::InvalidCidr {
                range: cidr.to_string(),
                reason: e.to_string(),
            })?;
            return Ok(Self { net });
        }
        let net: Ipv4Net = cidr.parse().map_err(|e: ipnet::AddrParseError| {
            AddressError::InvalidCidr {
                range: cidr.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self { net })
    }

    /// Check whether an address falls inside this range
    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        self.net.contains(&addr)
    }

    /// Lowest address in the range (the network address)
    pub fn low(&self) -> Ipv4Addr {
        self.net.network()
    }

    /// Highest address in the range (the broadcast address)
    pub fn high(&self) -> Ipv4Addr {
        self.net.broadcast()
    }

    /// Number of addresses covered by the range
    pub fn size(&self) -> u64 {
        1u64 << (32 - self.net.prefix_len())
    }

    /// Prefix length of the range
    pub fn prefix_len(&self) -> u8 {
        self.net.prefix_len()
    }
}

impl fmt::Display for IpAddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.net)
    }
}

impl TryFrom<String> for IpAddressRange {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_cidr(&value)
    }
}

impl From<IpAddressRange> for String {
    fn from(range: IpAddressRange) -> Self {
        range.to_string()
    }
}

/// Narrow a general address to IPv4, rejecting IPv6 explicitly
///
/// Request builders call this so that everything past the request boundary
/// works on `Ipv4Addr` and matching stays infallible.
pub fn require_ipv4(addr: IpAddr) -> Result<Ipv4Addr, AddressError> {
    match addr {
        IpAddr::V4(v4) => Ok(v4),
        IpAddr::V6(v6) => Err(AddressError::Ipv6Unsupported(v6.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cidr_containment() {
        let range = IpAddressRange::from_cidr("192.168.0.0/16").unwrap();
        assert!(range.contains("192.168.1.1".parse().unwrap()));
        assert!(range.contains("192.168.255.254".parse().unwrap()));
        assert!(!range.contains("192.169.0.1".parse().unwrap()));
        assert!(!range.contains("10.0.0.1".parse().unwrap()));
    }

    #[test]
    fn test_bare_address_is_host_range() {
        let range = IpAddressRange::from_cidr("10.1.2.3").unwrap();
        assert!(range.contains("10.1.2.3".parse().unwrap()));
        assert!(!range.contains("10.1.2.4".parse().unwrap()));
        assert_eq!(range.size(), 1);
    }

    #[test]
    fn test_low_high_size() {
        let range = IpAddressRange::from_cidr("10.0.0.0/24").unwrap();
        assert_eq!(range.low(), "10.0.0.0".parse::<Ipv4Addr>().unwrap());
        assert_eq!(range.high(), "10.0.0.255".parse::<Ipv4Addr>().unwrap());
        assert_eq!(range.size(), 256);
    }

    #[test]
    fn test_ipv6_is_rejected() {
        assert!(matches!(
            IpAddressRange::from_cidr("2001:db8::/32"),
            Err(AddressError::Ipv6Unsupported(_))
        ));
        assert!(matches!(
            require_ipv4("::1".parse().unwrap()),
            Err(AddressError::Ipv6Unsupported(_))
        ));
    }

    #[test]
    fn test_malformed_cidr_is_rejected() {
        assert!(matches!(
            IpAddressRange::from_cidr("not-a-range"),
            Err(AddressError::InvalidCidr { .. })
        ));
        assert!(matches!(
            IpAddressRange::from_cidr("10.0.0.0/40"),
            Err(AddressError::InvalidCidr { .. })
        ));
    }

    #[test]
    fn test_serde_round_trip() {
        let range = IpAddressRange::from_cidr("172.16.0.0/12").unwrap();
        let json = serde_json::to_string(&range).unwrap();
        assert_eq!(json, "\"172.16.0.0/12\"");
        let back: IpAddressRange = serde_json::from_str(&json).unwrap();
        assert_eq!(range, back);
    }
}
