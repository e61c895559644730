//! Text conversions for the address fields carried in a DHCP header.

use super::error::PacketError;
use std::{fmt, net::Ipv4Addr, str::FromStr};

/// Parses dotted-decimal text into an IPv4 address.
///
/// Only ASCII digits and `.` are accepted. A NUL byte ends the input the way
/// it would end a C string, so `"10.0.0.1\0garbage"` parses as `10.0.0.1`.
/// Exactly four groups are required, each in `0..=255`.
pub fn parse_ipv4(text: &str) -> Result<Ipv4Addr, PacketError> {
    let invalid = || PacketError::InvalidAddressFormat(text.to_string());
    let input = text.split('\0').next().unwrap_or_default();
    if input.is_empty() {
        return Err(invalid());
    }

    let mut octets = [0u8; 4];
    let mut group = 0usize;
    let mut value: u16 = 0;
    let mut digits = 0usize;

    for ch in input.bytes() {
        match ch {
            b'0'..=b'9' => {
                value = value * 10 + u16::from(ch - b'0');
                if value > 255 {
                    return Err(invalid());
                }
                digits += 1;
            }
            b'.' => {
                if digits == 0 || group == 3 {
                    return Err(invalid());
                }
                octets[group] = value as u8;
                group += 1;
                value = 0;
                digits = 0;
            }
            _ => return Err(invalid()),
        }
    }

    if digits == 0 || group != 3 {
        return Err(invalid());
    }
    octets[3] = value as u8;
    Ok(Ipv4Addr::from(octets))
}

/// Renders an IPv4 address as four dot-separated decimal groups.
pub fn format_ipv4(addr: Ipv4Addr) -> String {
    let [a, b, c, d] = addr.octets();
    format!("{a}.{b}.{c}.{d}")
}

/// Decodes an even-length hex string such as `c0a80189` into bytes.
pub fn parse_hex_bytes(text: &str) -> Result<Vec<u8>, PacketError> {
    let digits = text.trim();
    if digits.len() % 2 != 0 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(PacketError::InvalidHex(text.to_string()));
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|_| PacketError::InvalidHex(text.to_string()))
        })
        .collect()
}

/// A 6-byte Ethernet hardware address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 6]> for MacAddr {
    fn from(octets: [u8; 6]) -> Self {
        MacAddr(octets)
    }
}

impl FromStr for MacAddr {
    type Err = PacketError;

    /// Parses six colon-separated hex octets, e.g. `0a:1b:2c:3d:4e:5f`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PacketError::InvalidHardwareAddress(s.to_string());
        let mut octets = [0u8; 6];
        let mut count = 0;
        for part in s.trim().split(':') {
            if count == 6
                || part.is_empty()
                || part.len() > 2
                || !part.bytes().all(|b| b.is_ascii_hexdigit())
            {
                return Err(invalid());
            }
            octets[count] = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
            count += 1;
        }
        if count != 6 {
            return Err(invalid());
        }
        Ok(MacAddr(octets))
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}
