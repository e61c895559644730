//! DHCP option TLVs (RFC 2132).
//!
//! Options are kept as raw `(code, payload)` pairs in the order they appear
//! on the wire. Typed views are offered for the handful of options the tool
//! renders or fills in itself.

use bytes::Bytes;
use std::{fmt, net::Ipv4Addr, str::FromStr};

/// Well-known option codes.
pub mod code {
    pub const PAD: u8 = 0;
    pub const SUBNET_MASK: u8 = 1;
    pub const ROUTER: u8 = 3;
    pub const DOMAIN_NAME_SERVER: u8 = 6;
    pub const HOSTNAME: u8 = 12;
    pub const DOMAIN_NAME: u8 = 15;
    pub const INTERFACE_MTU: u8 = 26;
    pub const BROADCAST_ADDRESS: u8 = 28;
    pub const REQUESTED_IP_ADDRESS: u8 = 50;
    pub const ADDRESS_LEASE_TIME: u8 = 51;
    pub const OPTION_OVERLOAD: u8 = 52;
    pub const MESSAGE_TYPE: u8 = 53;
    pub const SERVER_IDENTIFIER: u8 = 54;
    pub const PARAMETER_REQUEST_LIST: u8 = 55;
    pub const MESSAGE: u8 = 56;
    pub const MAX_MESSAGE_SIZE: u8 = 57;
    pub const RENEWAL_TIME: u8 = 58;
    pub const REBINDING_TIME: u8 = 59;
    pub const VENDOR_CLASS_IDENTIFIER: u8 = 60;
    pub const CLIENT_IDENTIFIER: u8 = 61;
    pub const END: u8 = 255;
}

/// Largest payload a single option can carry (one length byte).
pub const MAX_OPTION_LEN: usize = 255;

/// Human-readable name of an option code, if it is one we know.
pub fn option_name(value: u8) -> Option<&'static str> {
    let name = match value {
        code::PAD => "pad",
        code::SUBNET_MASK => "subnet mask",
        code::ROUTER => "router",
        code::DOMAIN_NAME_SERVER => "domain name server",
        code::HOSTNAME => "hostname",
        code::DOMAIN_NAME => "domain name",
        code::INTERFACE_MTU => "interface MTU",
        code::BROADCAST_ADDRESS => "broadcast address",
        code::REQUESTED_IP_ADDRESS => "requested IP address",
        code::ADDRESS_LEASE_TIME => "address lease time",
        code::OPTION_OVERLOAD => "option overload",
        code::MESSAGE_TYPE => "DHCP message type",
        code::SERVER_IDENTIFIER => "server identifier",
        code::PARAMETER_REQUEST_LIST => "parameter request list",
        code::MESSAGE => "message",
        code::MAX_MESSAGE_SIZE => "maximum message size",
        code::RENEWAL_TIME => "renewal (T1) time",
        code::REBINDING_TIME => "rebinding (T2) time",
        code::VENDOR_CLASS_IDENTIFIER => "vendor class identifier",
        code::CLIENT_IDENTIFIER => "client identifier",
        code::END => "end",
        _ => return None,
    };
    Some(name)
}

/// DHCP message types carried in option 53.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    Discover = 1,
    Offer = 2,
    Request = 3,
    Decline = 4,
    Ack = 5,
    Nak = 6,
    Release = 7,
    Inform = 8,
}

impl TryFrom<u8> for MessageType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Discover),
            2 => Ok(Self::Offer),
            3 => Ok(Self::Request),
            4 => Ok(Self::Decline),
            5 => Ok(Self::Ack),
            6 => Ok(Self::Nak),
            7 => Ok(Self::Release),
            8 => Ok(Self::Inform),
            other => Err(other),
        }
    }
}

impl FromStr for MessageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "discover" => Ok(Self::Discover),
            "offer" => Ok(Self::Offer),
            "request" => Ok(Self::Request),
            "decline" => Ok(Self::Decline),
            "ack" => Ok(Self::Ack),
            "nak" => Ok(Self::Nak),
            "release" => Ok(Self::Release),
            "inform" => Ok(Self::Inform),
            other => Err(format!("unknown DHCP message type '{other}'")),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Discover => "DHCPDISCOVER",
            Self::Offer => "DHCPOFFER",
            Self::Request => "DHCPREQUEST",
            Self::Decline => "DHCPDECLINE",
            Self::Ack => "DHCPACK",
            Self::Nak => "DHCPNAK",
            Self::Release => "DHCPRELEASE",
            Self::Inform => "DHCPINFORM",
        };
        f.write_str(name)
    }
}

/// One option TLV: a code and its raw payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DhcpOption {
    pub code: u8,
    pub data: Bytes,
}

impl DhcpOption {
    pub fn new(code: u8, data: impl Into<Bytes>) -> Self {
        Self {
            code,
            data: data.into(),
        }
    }

    /// Size of this option on the wire, code and length bytes included.
    pub fn wire_len(&self) -> usize {
        2 + self.data.len()
    }

    pub fn as_u8(&self) -> Option<u8> {
        match self.data.as_ref() {
            [value] => Some(*value),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        let bytes: [u8; 4] = self.data[..].try_into().ok()?;
        Some(u32::from_be_bytes(bytes))
    }

    pub fn as_ipv4(&self) -> Option<Ipv4Addr> {
        let bytes: [u8; 4] = self.data[..].try_into().ok()?;
        Some(Ipv4Addr::from(bytes))
    }

    /// Interprets the payload as a list of IPv4 addresses.
    pub fn as_ipv4_list(&self) -> Option<Vec<Ipv4Addr>> {
        if self.data.is_empty() || self.data.len() % 4 != 0 {
            return None;
        }
        Some(
            self.data
                .chunks_exact(4)
                .map(|c| Ipv4Addr::new(c[0], c[1], c[2], c[3]))
                .collect(),
        )
    }
}

/// Options in wire order, with lookup by code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DhcpOptions(Vec<DhcpOption>);

impl DhcpOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, option: DhcpOption) {
        self.0.push(option);
    }

    /// First option with the given code.
    pub fn get(&self, code: u8) -> Option<&DhcpOption> {
        self.0.iter().find(|opt| opt.code == code)
    }

    pub fn contains(&self, code: u8) -> bool {
        self.get(code).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DhcpOption> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[DhcpOption] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a DhcpOptions {
    type Item = &'a DhcpOption;
    type IntoIter = std::slice::Iter<'a, DhcpOption>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<DhcpOption> for DhcpOptions {
    fn from_iter<T: IntoIterator<Item = DhcpOption>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_conversions() {
        for value in 1u8..=8 {
            let kind = MessageType::try_from(value).unwrap();
            assert_eq!(kind as u8, value);
        }
        assert_eq!(MessageType::try_from(0), Err(0));
        assert_eq!(MessageType::try_from(9), Err(9));
        assert_eq!("Inform".parse::<MessageType>(), Ok(MessageType::Inform));
        assert!("bogus".parse::<MessageType>().is_err());
        assert_eq!(MessageType::Offer.to_string(), "DHCPOFFER");
    }

    #[test]
    fn test_typed_views() {
        let mask = DhcpOption::new(code::SUBNET_MASK, vec![255, 255, 255, 0]);
        assert_eq!(mask.as_ipv4(), Some(Ipv4Addr::new(255, 255, 255, 0)));
        assert_eq!(mask.as_u32(), Some(0xffff_ff00));
        assert_eq!(mask.as_u8(), None);
        assert_eq!(mask.wire_len(), 6);

        let routers = DhcpOption::new(code::ROUTER, vec![10, 0, 0, 1, 10, 0, 0, 2]);
        assert_eq!(
            routers.as_ipv4_list(),
            Some(vec![Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2)])
        );
        assert_eq!(DhcpOption::new(code::ROUTER, vec![1, 2, 3]).as_ipv4_list(), None);
    }

    #[test]
    fn test_lookup_returns_first_occurrence() {
        let options: DhcpOptions = vec![
            DhcpOption::new(code::MESSAGE_TYPE, vec![2]),
            DhcpOption::new(224, vec![1]),
            DhcpOption::new(224, vec![2]),
        ]
        .into_iter()
        .collect();

        assert_eq!(options.len(), 3);
        assert_eq!(options.get(224).unwrap().data.as_ref(), &[1]);
        assert!(options.contains(code::MESSAGE_TYPE));
        assert!(!options.contains(code::ROUTER));
    }

    #[test]
    fn test_option_names() {
        assert_eq!(option_name(code::MESSAGE_TYPE), Some("DHCP message type"));
        assert_eq!(option_name(224), None);
    }
}
