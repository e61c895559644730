//! The fixed BOOTP/DHCP header.
//!
//! ```text
//! 0                   1                   2                   3
//! 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +---------------+---------------+---------------+---------------+
//! |     op (1)    |   htype (1)   |   hlen (1)    |   hops (1)    |
//! +---------------+---------------+---------------+---------------+
//! |                            xid (4)                            |
//! +-------------------------------+-------------------------------+
//! |           secs (2)            |           flags (2)           |
//! +-------------------------------+-------------------------------+
//! |               ciaddr / yiaddr / siaddr / giaddr (4 each)      |
//! +---------------------------------------------------------------+
//! |                          chaddr (16)                          |
//! |                          sname  (64)                          |
//! |                          file  (128)                          |
//! +---------------------------------------------------------------+
//! |                    magic cookie (4) = 99.130.83.99            |
//! +---------------------------------------------------------------+
//! ```
//!
//! Fields are encoded and decoded one at a time by byte offset. Multi-byte
//! integers are big-endian on the wire.

use super::{addr::MacAddr, error::PacketError};
use std::net::Ipv4Addr;

pub(crate) const OP_OFFSET: usize = 0;
pub(crate) const HTYPE_OFFSET: usize = 1;
pub(crate) const HLEN_OFFSET: usize = 2;
pub(crate) const HOPS_OFFSET: usize = 3;
pub(crate) const XID_OFFSET: usize = 4;
pub(crate) const SECS_OFFSET: usize = 8;
pub(crate) const FLAGS_OFFSET: usize = 10;
pub(crate) const CIADDR_OFFSET: usize = 12;
pub(crate) const YIADDR_OFFSET: usize = 16;
pub(crate) const SIADDR_OFFSET: usize = 20;
pub(crate) const GIADDR_OFFSET: usize = 24;
pub(crate) const CHADDR_OFFSET: usize = 28;
pub(crate) const SNAME_OFFSET: usize = CHADDR_OFFSET + CHADDR_LEN;
pub(crate) const FILE_OFFSET: usize = SNAME_OFFSET + SNAME_LEN;
pub(crate) const COOKIE_OFFSET: usize = FILE_OFFSET + FILE_LEN;

pub const CHADDR_LEN: usize = 16;
pub const SNAME_LEN: usize = 64;
pub const FILE_LEN: usize = 128;

/// Length of the BOOTP fields, `op` through `file`.
pub const BOOTP_HEADER_LEN: usize = COOKIE_OFFSET;

/// Length of the fixed header including the magic cookie; options start here.
pub const HEADER_LEN: usize = COOKIE_OFFSET + 4;

/// The magic cookie, bytes `63 82 53 63` read as a big-endian integer.
pub const MAGIC_COOKIE: u32 = 0x6382_5363;

pub const BOOTREQUEST: u8 = 1;
pub const BOOTREPLY: u8 = 2;
pub const HTYPE_ETHERNET: u8 = 1;
pub const HLEN_ETHERNET: u8 = 6;

/// Bit 15 of `flags`: the client asks for a broadcast reply.
pub const FLAG_BROADCAST: u16 = 0x8000;

/// A decoded DHCP header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DhcpHeader {
    pub op: u8,
    pub htype: u8,
    pub hlen: u8,
    pub hops: u8,
    pub xid: u32,
    pub secs: u16,
    pub flags: u16,
    pub ciaddr: Ipv4Addr,
    pub yiaddr: Ipv4Addr,
    pub siaddr: Ipv4Addr,
    pub giaddr: Ipv4Addr,
    pub chaddr: [u8; CHADDR_LEN],
    pub sname: [u8; SNAME_LEN],
    pub file: [u8; FILE_LEN],
    pub cookie: u32,
}

impl Default for DhcpHeader {
    /// A BOOTREQUEST over Ethernet with the magic cookie and every other field zeroed.
    fn default() -> Self {
        Self {
            op: BOOTREQUEST,
            htype: HTYPE_ETHERNET,
            hlen: 0,
            hops: 0,
            xid: 0,
            secs: 0,
            flags: 0,
            ciaddr: Ipv4Addr::UNSPECIFIED,
            yiaddr: Ipv4Addr::UNSPECIFIED,
            siaddr: Ipv4Addr::UNSPECIFIED,
            giaddr: Ipv4Addr::UNSPECIFIED,
            chaddr: [0; CHADDR_LEN],
            sname: [0; SNAME_LEN],
            file: [0; FILE_LEN],
            cookie: MAGIC_COOKIE,
        }
    }
}

impl DhcpHeader {
    /// Decodes the first [`HEADER_LEN`] bytes of `buf`.
    ///
    /// The cookie is decoded as-is; checking it is the parser's job.
    pub fn decode(buf: &[u8]) -> Result<Self, PacketError> {
        if buf.len() < HEADER_LEN {
            return Err(PacketError::TooShort {
                len: buf.len(),
                min: HEADER_LEN,
            });
        }

        Ok(Self {
            op: buf[OP_OFFSET],
            htype: buf[HTYPE_OFFSET],
            hlen: buf[HLEN_OFFSET],
            hops: buf[HOPS_OFFSET],
            xid: read_u32(buf, XID_OFFSET),
            secs: read_u16(buf, SECS_OFFSET),
            flags: read_u16(buf, FLAGS_OFFSET),
            ciaddr: Ipv4Addr::from(read_u32(buf, CIADDR_OFFSET)),
            yiaddr: Ipv4Addr::from(read_u32(buf, YIADDR_OFFSET)),
            siaddr: Ipv4Addr::from(read_u32(buf, SIADDR_OFFSET)),
            giaddr: Ipv4Addr::from(read_u32(buf, GIADDR_OFFSET)),
            chaddr: read_array(buf, CHADDR_OFFSET),
            sname: read_array(buf, SNAME_OFFSET),
            file: read_array(buf, FILE_OFFSET),
            cookie: read_u32(buf, COOKIE_OFFSET),
        })
    }

    /// Writes every field into the first [`HEADER_LEN`] bytes of `buf`.
    ///
    /// # Panics
    /// If `buf` is shorter than [`HEADER_LEN`].
    pub fn encode_into(&self, buf: &mut [u8]) {
        buf[OP_OFFSET] = self.op;
        buf[HTYPE_OFFSET] = self.htype;
        buf[HLEN_OFFSET] = self.hlen;
        buf[HOPS_OFFSET] = self.hops;
        write_bytes(buf, XID_OFFSET, &self.xid.to_be_bytes());
        write_bytes(buf, SECS_OFFSET, &self.secs.to_be_bytes());
        write_bytes(buf, FLAGS_OFFSET, &self.flags.to_be_bytes());
        write_bytes(buf, CIADDR_OFFSET, &self.ciaddr.octets());
        write_bytes(buf, YIADDR_OFFSET, &self.yiaddr.octets());
        write_bytes(buf, SIADDR_OFFSET, &self.siaddr.octets());
        write_bytes(buf, GIADDR_OFFSET, &self.giaddr.octets());
        write_bytes(buf, CHADDR_OFFSET, &self.chaddr);
        write_bytes(buf, SNAME_OFFSET, &self.sname);
        write_bytes(buf, FILE_OFFSET, &self.file);
        write_bytes(buf, COOKIE_OFFSET, &self.cookie.to_be_bytes());
    }

    pub fn is_broadcast(&self) -> bool {
        self.flags & FLAG_BROADCAST != 0
    }

    /// The significant part of `chaddr`, clamped to the field width.
    pub fn chaddr_bytes(&self) -> &[u8] {
        let len = usize::from(self.hlen).min(CHADDR_LEN);
        &self.chaddr[..len]
    }

    /// The client MAC, when the header describes a 6-byte hardware address.
    pub fn client_mac(&self) -> Option<MacAddr> {
        let bytes: [u8; 6] = self.chaddr_bytes().try_into().ok()?;
        Some(MacAddr(bytes))
    }

    /// `sname` up to its first NUL, lossily decoded.
    pub fn sname_str(&self) -> String {
        nul_terminated(&self.sname)
    }

    /// `file` up to its first NUL, lossily decoded.
    pub fn file_str(&self) -> String {
        nul_terminated(&self.file)
    }
}

fn read_u16(buf: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([buf[offset], buf[offset + 1]])
}

fn read_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
}

fn read_array<const N: usize>(buf: &[u8], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&buf[offset..offset + N]);
    out
}

pub(crate) fn write_bytes(buf: &mut [u8], offset: usize, bytes: &[u8]) {
    buf[offset..offset + bytes.len()].copy_from_slice(bytes);
}

fn nul_terminated(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}
