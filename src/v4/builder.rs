//! Assembles a DHCP message directly into its wire buffer.
//!
//! The builder owns one growable buffer. Header setters write into the fixed
//! region by offset; options are appended after it. `finalize` adds the end
//! option and hands the buffer over, consuming the builder.

use super::{
    error::PacketError,
    header::{self, DhcpHeader, CHADDR_LEN, FILE_LEN, HEADER_LEN, SNAME_LEN},
    options::{code, MessageType, MAX_OPTION_LEN},
};
use bytes::{BufMut as _, Bytes, BytesMut};
use std::net::Ipv4Addr;

/// Room reserved for options on top of the header, enough for the usual request.
const OPTIONS_CAPACITY: usize = 64;

#[derive(Debug)]
pub struct MessageBuilder {
    buf: BytesMut,
}

impl Default for MessageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageBuilder {
    /// A zeroed header with `op = BOOTREQUEST`, `htype = 1` and the magic cookie.
    pub fn new() -> Self {
        Self::from_header(&DhcpHeader::default())
    }

    /// Starts from an existing header record.
    pub fn from_header(header: &DhcpHeader) -> Self {
        let mut buf = BytesMut::with_capacity(HEADER_LEN + OPTIONS_CAPACITY);
        buf.resize(HEADER_LEN, 0);
        header.encode_into(&mut buf);
        Self { buf }
    }

    pub fn set_op(&mut self, op: u8) -> &mut Self {
        self.buf[header::OP_OFFSET] = op;
        self
    }

    pub fn set_htype(&mut self, htype: u8) -> &mut Self {
        self.buf[header::HTYPE_OFFSET] = htype;
        self
    }

    /// Sets `hlen` without touching `chaddr`.
    pub fn set_hlen(&mut self, hlen: u8) -> &mut Self {
        self.buf[header::HLEN_OFFSET] = hlen;
        self
    }

    pub fn set_hops(&mut self, hops: u8) -> &mut Self {
        self.buf[header::HOPS_OFFSET] = hops;
        self
    }

    pub fn set_xid(&mut self, xid: u32) -> &mut Self {
        self.write(header::XID_OFFSET, &xid.to_be_bytes())
    }

    pub fn set_secs(&mut self, secs: u16) -> &mut Self {
        self.write(header::SECS_OFFSET, &secs.to_be_bytes())
    }

    pub fn set_flags(&mut self, flags: u16) -> &mut Self {
        self.write(header::FLAGS_OFFSET, &flags.to_be_bytes())
    }

    /// Sets or clears the broadcast bit, leaving the other flag bits alone.
    pub fn set_broadcast(&mut self, broadcast: bool) -> &mut Self {
        let current = u16::from_be_bytes([
            self.buf[header::FLAGS_OFFSET],
            self.buf[header::FLAGS_OFFSET + 1],
        ]);
        let flags = if broadcast {
            current | header::FLAG_BROADCAST
        } else {
            current & !header::FLAG_BROADCAST
        };
        self.set_flags(flags)
    }

    pub fn set_ciaddr(&mut self, addr: Ipv4Addr) -> &mut Self {
        self.write(header::CIADDR_OFFSET, &addr.octets())
    }

    pub fn set_yiaddr(&mut self, addr: Ipv4Addr) -> &mut Self {
        self.write(header::YIADDR_OFFSET, &addr.octets())
    }

    pub fn set_siaddr(&mut self, addr: Ipv4Addr) -> &mut Self {
        self.write(header::SIADDR_OFFSET, &addr.octets())
    }

    pub fn set_giaddr(&mut self, addr: Ipv4Addr) -> &mut Self {
        self.write(header::GIADDR_OFFSET, &addr.octets())
    }

    /// Overwrites all 16 bytes of `chaddr`. `hlen` is left as it is.
    pub fn set_chaddr_raw(&mut self, chaddr: [u8; CHADDR_LEN]) -> &mut Self {
        self.write(header::CHADDR_OFFSET, &chaddr)
    }

    /// Copies a hardware address into `chaddr` and sets `hlen` to its length.
    pub fn set_chaddr(&mut self, hwaddr: &[u8]) -> Result<&mut Self, PacketError> {
        if hwaddr.len() > CHADDR_LEN {
            return Err(PacketError::HardwareAddressTooLong(hwaddr.len()));
        }
        let mut chaddr = [0u8; CHADDR_LEN];
        chaddr[..hwaddr.len()].copy_from_slice(hwaddr);
        self.set_chaddr_raw(chaddr);
        Ok(self.set_hlen(hwaddr.len() as u8))
    }

    /// Server host name; must leave room for the terminating NUL.
    pub fn set_sname(&mut self, sname: &str) -> Result<&mut Self, PacketError> {
        let field = text_field::<SNAME_LEN>("sname", sname)?;
        Ok(self.write(header::SNAME_OFFSET, &field))
    }

    /// Boot file name; must leave room for the terminating NUL.
    pub fn set_file(&mut self, file: &str) -> Result<&mut Self, PacketError> {
        let field = text_field::<FILE_LEN>("file", file)?;
        Ok(self.write(header::FILE_OFFSET, &field))
    }

    /// Appends one option TLV.
    ///
    /// Nothing is written when the payload exceeds 255 bytes or the code is
    /// one of the framing codes (pad, end).
    pub fn add_option(&mut self, code: u8, data: &[u8]) -> Result<&mut Self, PacketError> {
        if code == code::PAD || code == code::END {
            return Err(PacketError::ReservedOptionCode(code));
        }
        if data.len() > MAX_OPTION_LEN {
            return Err(PacketError::OptionTooLarge {
                code,
                len: data.len(),
            });
        }
        self.buf.reserve(2 + data.len());
        self.buf.put_u8(code);
        self.buf.put_u8(data.len() as u8);
        self.buf.put_slice(data);
        Ok(self)
    }

    pub fn add_option_u8(&mut self, code: u8, value: u8) -> Result<&mut Self, PacketError> {
        self.add_option(code, &[value])
    }

    /// Appends option 53.
    pub fn add_message_type(&mut self, kind: MessageType) -> &mut Self {
        self.buf.put_u8(code::MESSAGE_TYPE);
        self.buf.put_u8(1);
        self.buf.put_u8(kind as u8);
        self
    }

    /// Bytes written so far, terminator excluded.
    pub fn encoded_len(&self) -> usize {
        self.buf.len()
    }

    /// Appends the end option and returns the finished message.
    pub fn finalize(mut self) -> Bytes {
        self.buf.put_u8(code::END);
        self.buf.freeze()
    }

    fn write(&mut self, offset: usize, bytes: &[u8]) -> &mut Self {
        header::write_bytes(&mut self.buf, offset, bytes);
        self
    }
}

fn text_field<const N: usize>(field: &'static str, text: &str) -> Result<[u8; N], PacketError> {
    let bytes = text.as_bytes();
    if bytes.len() >= N {
        return Err(PacketError::FieldTooLong {
            field,
            len: bytes.len(),
            max: N - 1,
        });
    }
    let mut out = [0u8; N];
    out[..bytes.len()].copy_from_slice(bytes);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_prefills_header() {
        let buf = MessageBuilder::new().finalize();

        assert_eq!(buf.len(), HEADER_LEN + 1);
        assert_eq!(buf[0], header::BOOTREQUEST);
        assert_eq!(buf[1], header::HTYPE_ETHERNET);
        assert!(buf[2..236].iter().all(|&b| b == 0));
        assert_eq!(&buf[236..240], &[99, 130, 83, 99]);
        assert_eq!(buf[240], code::END);
    }

    #[test]
    fn test_options_follow_header_in_append_order() {
        let mut builder = MessageBuilder::new();
        builder
            .add_message_type(MessageType::Discover)
            .add_option(code::PARAMETER_REQUEST_LIST, &[1, 3, 6])
            .unwrap()
            .add_option_u8(224, 9)
            .unwrap();
        let buf = builder.finalize();

        assert_eq!(
            &buf[HEADER_LEN..],
            &[53, 1, 1, 55, 3, 1, 3, 6, 224, 1, 9, code::END]
        );
    }

    #[test]
    fn test_header_survives_buffer_growth() {
        let mut builder = MessageBuilder::new();
        builder.set_xid(0xcafe_f00d);
        for code in 1..=20u8 {
            builder.add_option(code, &[code; 200]).unwrap();
        }
        builder.set_secs(7);
        let buf = builder.finalize();

        assert_eq!(buf.len(), HEADER_LEN + 20 * 202 + 1);
        assert_eq!(&buf[4..8], &[0xca, 0xfe, 0xf0, 0x0d]);
        assert_eq!(&buf[8..10], &[0, 7]);
        assert_eq!(&buf[236..240], &[99, 130, 83, 99]);
    }

    #[test]
    fn test_option_size_limit() {
        let mut builder = MessageBuilder::new();
        assert!(builder.add_option(43, &[0xab; 255]).is_ok());
        let before = builder.encoded_len();

        let err = builder.add_option(43, &[0xab; 256]).unwrap_err();
        assert_eq!(err, PacketError::OptionTooLarge { code: 43, len: 256 });
        assert_eq!(builder.encoded_len(), before);
    }

    #[test]
    fn test_reserved_codes_rejected() {
        let mut builder = MessageBuilder::new();
        assert_eq!(
            builder.add_option(code::PAD, &[]).unwrap_err(),
            PacketError::ReservedOptionCode(0)
        );
        assert_eq!(
            builder.add_option(code::END, &[1]).unwrap_err(),
            PacketError::ReservedOptionCode(255)
        );
        assert_eq!(builder.encoded_len(), HEADER_LEN);
    }

    #[test]
    fn test_set_chaddr_sets_hlen() {
        let mut builder = MessageBuilder::new();
        builder.set_chaddr(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        let buf = builder.finalize();
        assert_eq!(buf[2], 8);
        assert_eq!(&buf[28..36], &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert!(buf[36..44].iter().all(|&b| b == 0));

        let mut builder = MessageBuilder::new();
        assert_eq!(
            builder.set_chaddr(&[0; 17]).unwrap_err(),
            PacketError::HardwareAddressTooLong(17)
        );
    }

    #[test]
    fn test_broadcast_bit_preserves_other_flags() {
        let mut builder = MessageBuilder::new();
        builder.set_flags(0x0001).set_broadcast(true);
        assert_eq!(builder.clone_bytes()[10..12], [0x80, 0x01]);
        builder.set_broadcast(false);
        assert_eq!(builder.clone_bytes()[10..12], [0x00, 0x01]);
    }

    #[test]
    fn test_text_fields_keep_nul() {
        let mut builder = MessageBuilder::new();
        builder.set_sname("tftp.example").unwrap();
        builder.set_file(&"x".repeat(127)).unwrap();
        assert_eq!(
            builder.set_sname(&"s".repeat(64)).unwrap_err(),
            PacketError::FieldTooLong {
                field: "sname",
                len: 64,
                max: 63
            }
        );
        let buf = builder.finalize();
        assert_eq!(&buf[44..56], b"tftp.example");
        assert_eq!(buf[56], 0);
        assert_eq!(buf[235], 0);
        assert_eq!(buf[234], b'x');
    }

    impl MessageBuilder {
        fn clone_bytes(&self) -> Vec<u8> {
            self.buf.to_vec()
        }
    }
}
