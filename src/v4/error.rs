use thiserror::Error;

/// Errors produced while building or parsing a DHCPv4 message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PacketError {
    #[error("Option {code} payload is {len} bytes, the limit is 255")]
    OptionTooLarge { code: u8, len: usize },

    #[error("Option code {0} is reserved for framing (pad/end)")]
    ReservedOptionCode(u8),

    #[error("Hardware address is {0} bytes, chaddr holds at most 16")]
    HardwareAddressTooLong(usize),

    #[error("Field '{field}' holds at most {max} bytes of text, got {len}")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("Packet too short: {len} bytes (minimum {min})")]
    TooShort { len: usize, min: usize },

    #[error("Invalid magic cookie {0:#010x}")]
    InvalidCookie(u32),

    #[error("Option {code} at offset {offset} is missing its length byte")]
    TruncatedOption { code: u8, offset: usize },

    #[error("Option {code} at offset {offset} declares {len} bytes but only {available} remain")]
    OversizeOption {
        code: u8,
        offset: usize,
        len: usize,
        available: usize,
    },

    #[error("Options area ended at offset {0} without an end option")]
    MissingTerminator(usize),

    #[error("Invalid IPv4 address '{0}'")]
    InvalidAddressFormat(String),

    #[error("Invalid hardware address '{0}'")]
    InvalidHardwareAddress(String),

    #[error("Invalid hex string '{0}'")]
    InvalidHex(String),
}
