//! # dhcputil - Send a DHCPv4 message and inspect the replies
//!
//! dhcputil builds a single DHCP client message (DISCOVER, REQUEST, DECLINE,
//! RELEASE or INFORM), broadcasts it from a chosen network interface and
//! prints whatever servers answer. It is a diagnostic tool: no lease is
//! stored and nothing is retried.
//!
//! ## Features
//!
//! - DHCPv4 wire codec with a consuming message builder and a bounds-checked parser
//! - Full control over header fields and raw option overrides
//! - Socket bound to one interface with `SO_BINDTODEVICE` (Linux)
//! - Bounded reply window using Tokio timers
//!
//! ## Example
//!
//! ```rust
//! use dhcputil::v4::{code, DhcpMessage, MessageBuilder, MessageType};
//!
//! let mut builder = MessageBuilder::new();
//! builder
//!     .set_xid(0x1234_5678)
//!     .set_chaddr(&[0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff])?
//!     .add_message_type(MessageType::Discover);
//! let packet = builder.finalize();
//!
//! let parsed = DhcpMessage::parse(&packet)?;
//! assert_eq!(parsed.xid(), 0x1234_5678);
//! assert_eq!(parsed.message_type(), Some(MessageType::Discover));
//! assert!(parsed.options.contains(code::MESSAGE_TYPE));
//! # Ok::<(), dhcputil::v4::PacketError>(())
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod network;
pub mod report;
pub mod v4;

pub use client::{DhcpClient, Reply};
pub use config::{Args, ProbeConfig};
pub use error::DhcpUtilError;
