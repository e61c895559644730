use super::{
    addr::MacAddr,
    builder::MessageBuilder,
    error::PacketError,
    header::{BOOTREQUEST, FLAG_BROADCAST, HTYPE_ETHERNET},
    options::{code, DhcpOption, MessageType},
};
use bytes::Bytes;
use std::net::Ipv4Addr;

/// Options asked for when the caller does not supply its own option 55.
pub const DEFAULT_PARAMETER_REQUEST_LIST: [u8; 6] = [
    code::SUBNET_MASK,
    code::ROUTER,
    code::DOMAIN_NAME_SERVER,
    code::DOMAIN_NAME,
    code::ADDRESS_LEASE_TIME,
    code::SERVER_IDENTIFIER,
];

/// Everything that goes into one client request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestParams {
    pub message_type: MessageType,
    pub xid: u32,
    pub secs: u16,
    pub flags: u16,
    pub mac: MacAddr,
    pub ciaddr: Ipv4Addr,
    pub yiaddr: Ipv4Addr,
    pub giaddr: Ipv4Addr,
    pub server_id: Option<Ipv4Addr>,
    pub sname: String,
    pub file: String,
    /// Raw options appended after the generated ones, in order.
    pub extra_options: Vec<DhcpOption>,
}

impl RequestParams {
    /// A broadcast request of `message_type` from `mac` with every address zeroed.
    pub fn new(message_type: MessageType, xid: u32, mac: MacAddr) -> Self {
        Self {
            message_type,
            xid,
            secs: 0,
            flags: FLAG_BROADCAST,
            mac,
            ciaddr: Ipv4Addr::UNSPECIFIED,
            yiaddr: Ipv4Addr::UNSPECIFIED,
            giaddr: Ipv4Addr::UNSPECIFIED,
            server_id: None,
            sname: String::new(),
            file: String::new(),
            extra_options: Vec::new(),
        }
    }

    fn overrides(&self, option_code: u8) -> bool {
        self.extra_options.iter().any(|opt| opt.code == option_code)
    }
}

/// Builds a client request.
///
/// Option order: message type (53), server identifier (54) when known,
/// client identifier (61) and parameter request list (55), then the caller's
/// options as given. A generated option is left out when the caller supplies
/// one with the same code.
pub fn build_request(params: &RequestParams) -> Result<Bytes, PacketError> {
    let mut builder = MessageBuilder::new();
    builder
        .set_op(BOOTREQUEST)
        .set_htype(HTYPE_ETHERNET)
        .set_hops(0)
        .set_xid(params.xid)
        .set_secs(params.secs)
        .set_flags(params.flags)
        .set_ciaddr(params.ciaddr)
        .set_yiaddr(params.yiaddr)
        .set_giaddr(params.giaddr)
        .set_chaddr(params.mac.as_bytes())?
        .set_sname(&params.sname)?
        .set_file(&params.file)?;

    if !params.overrides(code::MESSAGE_TYPE) {
        builder.add_message_type(params.message_type);
    }

    if let Some(server_id) = params.server_id {
        if !params.overrides(code::SERVER_IDENTIFIER) {
            builder.add_option(code::SERVER_IDENTIFIER, &server_id.octets())?;
        }
    }

    if !params.overrides(code::CLIENT_IDENTIFIER) {
        // htype followed by the hardware address
        let mut client_id = [0u8; 7];
        client_id[0] = HTYPE_ETHERNET;
        client_id[1..].copy_from_slice(params.mac.as_bytes());
        builder.add_option(code::CLIENT_IDENTIFIER, &client_id)?;
    }

    let wants_parameters = !matches!(
        params.message_type,
        MessageType::Release | MessageType::Decline
    );
    if wants_parameters && !params.overrides(code::PARAMETER_REQUEST_LIST) {
        builder.add_option(code::PARAMETER_REQUEST_LIST, &DEFAULT_PARAMETER_REQUEST_LIST)?;
    }

    for option in &params.extra_options {
        builder.add_option(option.code, &option.data)?;
    }

    Ok(builder.finalize())
}
