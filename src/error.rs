use crate::{network::SocketError, v4::PacketError};
use std::{io, time::Duration};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DhcpUtilError {
    #[error("Socket operation failed")]
    Socket(#[from] SocketError),

    #[error("I/O error")]
    Io(#[from] io::Error),

    #[error("DHCP packet error")]
    Packet(#[from] PacketError),

    #[error("Failed to parse MAC address: {0}")]
    MacParse(String),

    #[error("Interface '{0}' not found or has no MAC address")]
    InterfaceInvalid(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No reply received within {0:?}")]
    ReceiveTimeout(Duration),
}
