//! Turns a received datagram back into a header and its option list.

use super::{
    error::PacketError,
    header::{DhcpHeader, HEADER_LEN, MAGIC_COOKIE},
    options::{code, DhcpOption, DhcpOptions, MessageType},
};
use bytes::Bytes;
use std::{net::Ipv4Addr, time::Duration};

/// A parsed DHCP message. Option payloads are owned copies of the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DhcpMessage {
    pub header: DhcpHeader,
    pub options: DhcpOptions,
}

impl DhcpMessage {
    /// Parses a complete DHCP message.
    ///
    /// # Errors
    ///
    /// - [`PacketError::TooShort`] if `buf` cannot hold the fixed header
    /// - [`PacketError::InvalidCookie`] if the magic cookie is wrong
    /// - [`PacketError::TruncatedOption`] if an option code is the last byte
    /// - [`PacketError::OversizeOption`] if an option runs past the buffer
    /// - [`PacketError::MissingTerminator`] if the buffer ends before option 255
    pub fn parse(buf: &[u8]) -> Result<Self, PacketError> {
        let header = DhcpHeader::decode(buf)?;
        if header.cookie != MAGIC_COOKIE {
            return Err(PacketError::InvalidCookie(header.cookie));
        }
        let options = parse_options(buf, HEADER_LEN)?;
        Ok(Self { header, options })
    }

    pub fn xid(&self) -> u32 {
        self.header.xid
    }

    /// Option 53, when present and one of the known values.
    pub fn message_type(&self) -> Option<MessageType> {
        let value = self.options.get(code::MESSAGE_TYPE)?.as_u8()?;
        MessageType::try_from(value).ok()
    }

    pub fn server_identifier(&self) -> Option<Ipv4Addr> {
        self.options.get(code::SERVER_IDENTIFIER)?.as_ipv4()
    }

    pub fn subnet_mask(&self) -> Option<Ipv4Addr> {
        self.options.get(code::SUBNET_MASK)?.as_ipv4()
    }

    pub fn routers(&self) -> Option<Vec<Ipv4Addr>> {
        self.options.get(code::ROUTER)?.as_ipv4_list()
    }

    pub fn dns_servers(&self) -> Option<Vec<Ipv4Addr>> {
        self.options.get(code::DOMAIN_NAME_SERVER)?.as_ipv4_list()
    }

    pub fn lease_time(&self) -> Option<Duration> {
        let secs = self.options.get(code::ADDRESS_LEASE_TIME)?.as_u32()?;
        Some(Duration::from_secs(u64::from(secs)))
    }
}

/// Walks the TLV chain of `buf` starting at `start`.
///
/// Pad bytes are skipped. Anything after the end option is ignored.
pub fn parse_options(buf: &[u8], start: usize) -> Result<DhcpOptions, PacketError> {
    let mut options = DhcpOptions::new();
    let mut cursor = start;

    loop {
        let Some(&option_code) = buf.get(cursor) else {
            return Err(PacketError::MissingTerminator(cursor));
        };

        match option_code {
            code::END => return Ok(options),
            code::PAD => {
                cursor += 1;
                continue;
            }
            _ => {}
        }

        let Some(&len) = buf.get(cursor + 1) else {
            return Err(PacketError::TruncatedOption {
                code: option_code,
                offset: cursor,
            });
        };
        let len = usize::from(len);
        let data_start = cursor + 2;
        let data_end = data_start + len;
        if data_end > buf.len() {
            return Err(PacketError::OversizeOption {
                code: option_code,
                offset: cursor,
                len,
                available: buf.len() - data_start,
            });
        }

        options.push(DhcpOption::new(
            option_code,
            Bytes::copy_from_slice(&buf[data_start..data_end]),
        ));
        cursor = data_end;
    }
}
