//! DHCPv4 wire codec
//!
//! This module contains the DHCPv4 message format:
//! - Fixed header layout and field encoding
//! - Option TLVs and the option list
//! - Message builder and parser
//! - Address text conversions
//! - Client request assembly

pub mod addr;
pub mod builder;
pub mod error;
pub mod header;
pub mod message;
pub mod options;
pub mod parser;


pub use addr::{format_ipv4, parse_hex_bytes, parse_ipv4, MacAddr};
pub use builder::MessageBuilder;
pub use error::PacketError;
pub use header::{DhcpHeader, HEADER_LEN, MAGIC_COOKIE};
pub use message::{build_request, RequestParams};
pub use options::{code, DhcpOption, DhcpOptions, MessageType};
pub use parser::DhcpMessage;
