use crate::{
    error::DhcpUtilError,
    v4::{parse_hex_bytes, parse_ipv4, DhcpOption, MacAddr, MessageType},
};
use clap::Parser;
use std::{
    net::{Ipv4Addr, SocketAddrV4},
    time::Duration,
};

pub const DHCP_CLIENT_PORT: u16 = 68;
pub const DHCP_SERVER_PORT: u16 = 67;

#[derive(Parser, Debug, Clone)]
#[command(name = "dhcputil", version, about = "Send a DHCP message and print the replies", long_about = None)]
pub struct Args {
    /// The network interface to bind to (e.g., 'eth0', 'lo')
    #[arg(short, long)]
    pub interface: String,

    /// Client IP address (ciaddr); defaults to the interface address
    #[arg(short = 'c', long = "client-ip")]
    pub client_ip: Option<String>,

    /// Seconds since the client began acquisition
    #[arg(short, long, default_value_t = 0)]
    pub seconds: u16,

    /// Transaction ID in hex; random when omitted
    #[arg(long)]
    pub xid: Option<String>,

    /// DHCP message type: discover, request, decline, release or inform
    #[arg(long, default_value = "request")]
    pub operation: String,

    /// BOOTP flags (uint16, 0x8000 is the broadcast bit)
    #[arg(long, default_value = "0x8000", value_parser = parse_u16)]
    pub flags: u16,

    /// Your (client) IP address (yiaddr)
    #[arg(short = 'y', long = "your-ip", default_value = "0.0.0.0")]
    pub your_ip: String,

    /// Gateway/relay agent IP address (giaddr)
    #[arg(short = 'g', long = "gateway-ip", default_value = "0.0.0.0")]
    pub gateway_ip: String,

    /// Server identifier to put in option 54 (from an OFFER)
    #[arg(short = 'S', long = "server-ip")]
    pub server_ip: Option<String>,

    /// Server host name string (sname)
    #[arg(long = "server-name", default_value = "")]
    pub server_name: String,

    /// Client boot file name string (file)
    #[arg(long = "client-boot-file", default_value = "")]
    pub boot_file: String,

    /// Seconds to wait for replies; 0 sends without waiting
    #[arg(short, long, default_value_t = 5)]
    pub timeout: u64,

    /// Maximum number of replies to wait for; 0 (default) waits until the timeout
    #[arg(long = "reply-cnt", default_value_t = 0)]
    pub reply_count: usize,

    /// Extra DHCP option as code=hexbytes (e.g. -X 50=c0a80189); repeatable
    #[arg(short = 'X', long = "dhcp-opt")]
    pub dhcp_opts: Vec<String>,

    /// Send from this source IP address
    #[arg(short = 'F', long = "src-ip")]
    pub src_ip: Option<String>,

    /// Send to this destination IP address
    #[arg(short = 'T', long = "dst-ip", default_value = "255.255.255.255")]
    pub dst_ip: String,

    /// TTL for outgoing datagrams
    #[arg(long)]
    pub ttl: Option<u32>,

    /// Destination MAC address
    #[arg(short = 'E', long = "dst-ether")]
    pub dst_ether: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Validated settings for one run.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub interface: String,
    pub message_type: MessageType,
    /// `None` picks a random transaction ID.
    pub xid: Option<u32>,
    pub secs: u16,
    pub flags: u16,
    /// `None` uses the interface address.
    pub client_ip: Option<Ipv4Addr>,
    pub your_ip: Ipv4Addr,
    pub gateway_ip: Ipv4Addr,
    pub server_id: Option<Ipv4Addr>,
    pub server_name: String,
    pub boot_file: String,
    pub options: Vec<DhcpOption>,
    pub bind_addr: SocketAddrV4,
    pub destination: SocketAddrV4,
    pub ttl: Option<u32>,
    pub dst_ether: Option<MacAddr>,
    pub timeout: Duration,
    /// 0 means no limit.
    pub reply_count: usize,
}

impl ProbeConfig {
    /// A broadcast DHCPREQUEST on `interface` with the command-line defaults:
    /// every reply within five seconds is collected.
    pub fn new(interface: String) -> Self {
        Self {
            interface,
            message_type: MessageType::Request,
            xid: None,
            secs: 0,
            flags: crate::v4::header::FLAG_BROADCAST,
            client_ip: None,
            your_ip: Ipv4Addr::UNSPECIFIED,
            gateway_ip: Ipv4Addr::UNSPECIFIED,
            server_id: None,
            server_name: String::new(),
            boot_file: String::new(),
            options: Vec::new(),
            bind_addr: SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, DHCP_CLIENT_PORT),
            destination: SocketAddrV4::new(Ipv4Addr::BROADCAST, DHCP_SERVER_PORT),
            ttl: None,
            dst_ether: None,
            timeout: Duration::from_secs(5),
            reply_count: 0,
        }
    }

    /// Whether the client should wait for replies at all.
    pub fn waits_for_reply(&self) -> bool {
        !self.timeout.is_zero()
    }
}

impl TryFrom<&Args> for ProbeConfig {
    type Error = DhcpUtilError;

    fn try_from(args: &Args) -> Result<Self, Self::Error> {
        if args.interface.is_empty() {
            return Err(DhcpUtilError::InvalidArgument(
                "interface name must not be empty".to_string(),
            ));
        }

        let message_type = parse_operation(&args.operation)?;
        let xid = args.xid.as_deref().map(parse_xid).transpose()?;
        let client_ip = args.client_ip.as_deref().map(parse_ipv4).transpose()?;
        let server_id = args.server_ip.as_deref().map(parse_ipv4).transpose()?;
        let src_ip = args
            .src_ip
            .as_deref()
            .map(parse_ipv4)
            .transpose()?
            .unwrap_or(Ipv4Addr::UNSPECIFIED);
        let dst_ether = args
            .dst_ether
            .as_deref()
            .map(str::parse::<MacAddr>)
            .transpose()?;
        let options = args
            .dhcp_opts
            .iter()
            .map(|spec| parse_dhcp_option(spec))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            interface: args.interface.clone(),
            message_type,
            xid,
            secs: args.seconds,
            flags: args.flags,
            client_ip,
            your_ip: parse_ipv4(&args.your_ip)?,
            gateway_ip: parse_ipv4(&args.gateway_ip)?,
            server_id,
            server_name: args.server_name.clone(),
            boot_file: args.boot_file.clone(),
            options,
            bind_addr: SocketAddrV4::new(src_ip, DHCP_CLIENT_PORT),
            destination: SocketAddrV4::new(parse_ipv4(&args.dst_ip)?, DHCP_SERVER_PORT),
            ttl: args.ttl,
            dst_ether,
            timeout: Duration::from_secs(args.timeout),
            reply_count: args.reply_count,
        })
    }
}

/// Client-side message types only; OFFER, ACK and NAK come from servers.
fn parse_operation(operation: &str) -> Result<MessageType, DhcpUtilError> {
    match operation.parse::<MessageType>() {
        Ok(
            kind @ (MessageType::Discover
            | MessageType::Request
            | MessageType::Decline
            | MessageType::Release
            | MessageType::Inform),
        ) => Ok(kind),
        _ => Err(DhcpUtilError::InvalidArgument(format!(
            "unsupported operation '{operation}' (expected discover, request, decline, release or inform)"
        ))),
    }
}

fn parse_xid(text: &str) -> Result<u32, DhcpUtilError> {
    let invalid =
        |reason: &str| DhcpUtilError::InvalidArgument(format!("invalid xid '{text}': {reason}"));
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid("expected hex digits"));
    }
    u32::from_str_radix(digits, 16).map_err(|e| invalid(&e.to_string()))
}

fn parse_u16(text: &str) -> Result<u16, String> {
    let (digits, radix) = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => (hex, 16),
        None => (text, 10),
    };
    if digits.starts_with('+') {
        return Err(format!("invalid uint16 '{text}': unexpected sign"));
    }
    u16::from_str_radix(digits, radix).map_err(|e| format!("invalid uint16 '{text}': {e}"))
}

/// Parses `code=hexbytes`, e.g. `50=c0a80189`.
pub fn parse_dhcp_option(spec: &str) -> Result<DhcpOption, DhcpUtilError> {
    let invalid = |reason: &str| {
        DhcpUtilError::InvalidArgument(format!("invalid DHCP option '{spec}': {reason}"))
    };
    let (code, hex) = spec
        .split_once('=')
        .ok_or_else(|| invalid("expected code=hexbytes"))?;
    let code: u8 = code
        .trim()
        .parse()
        .map_err(|_| invalid("code must be 1-254"))?;
    if code == 0 || code == 255 {
        return Err(invalid("code must be 1-254"));
    }
    let data = parse_hex_bytes(hex)?;
    if data.len() > crate::v4::options::MAX_OPTION_LEN {
        return Err(invalid("payload longer than 255 bytes"));
    }
    Ok(DhcpOption::new(code, data))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["dhcputil", "-i", "eth0"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = ProbeConfig::try_from(&args(&[])).unwrap();
        assert_eq!(config.interface, "eth0");
        assert_eq!(config.message_type, MessageType::Request);
        assert_eq!(config.flags, 0x8000);
        assert_eq!(config.xid, None);
        assert_eq!(config.client_ip, None);
        assert_eq!(config.bind_addr, SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 68));
        assert_eq!(config.destination, SocketAddrV4::new(Ipv4Addr::BROADCAST, 67));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.reply_count, 0);
        assert!(config.waits_for_reply());
    }

    #[test]
    fn test_full_argument_set() {
        let config = ProbeConfig::try_from(&args(&[
            "--operation",
            "discover",
            "--xid",
            "0xdeadbeef",
            "--flags",
            "0",
            "-c",
            "10.0.0.5",
            "-y",
            "10.0.0.6",
            "-g",
            "10.0.0.254",
            "-S",
            "10.0.0.1",
            "-F",
            "10.0.0.5",
            "-T",
            "10.0.0.1",
            "--ttl",
            "16",
            "-E",
            "aa:bb:cc:dd:ee:ff",
            "-X",
            "50=0a000006",
            "-X",
            "12=686f7374",
            "-t",
            "0",
            "--reply-cnt",
            "3",
            "-vv",
        ]))
        .unwrap();

        assert_eq!(config.message_type, MessageType::Discover);
        assert_eq!(config.xid, Some(0xdead_beef));
        assert_eq!(config.flags, 0);
        assert_eq!(config.client_ip, Some(Ipv4Addr::new(10, 0, 0, 5)));
        assert_eq!(config.your_ip, Ipv4Addr::new(10, 0, 0, 6));
        assert_eq!(config.gateway_ip, Ipv4Addr::new(10, 0, 0, 254));
        assert_eq!(config.server_id, Some(Ipv4Addr::new(10, 0, 0, 1)));
        assert_eq!(config.bind_addr, SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 5), 68));
        assert_eq!(config.destination, SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 1), 67));
        assert_eq!(config.ttl, Some(16));
        assert_eq!(config.dst_ether, Some(MacAddr([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff])));
        assert_eq!(config.options.len(), 2);
        assert_eq!(config.options[0].code, 50);
        assert_eq!(config.options[1].data.as_ref(), b"host");
        assert!(!config.waits_for_reply());
        assert_eq!(config.reply_count, 3);
    }

    #[test]
    fn test_rejects_server_only_operation() {
        let err = ProbeConfig::try_from(&args(&["--operation", "offer"])).unwrap_err();
        assert!(matches!(err, DhcpUtilError::InvalidArgument(_)));
    }

    #[test]
    fn test_rejects_bad_addresses() {
        assert!(ProbeConfig::try_from(&args(&["-c", "10.0.0"])).is_err());
        assert!(ProbeConfig::try_from(&args(&["-T", "300.0.0.1"])).is_err());
        assert!(ProbeConfig::try_from(&args(&["-E", "aa:bb"])).is_err());
    }

    #[test]
    fn test_parse_dhcp_option() {
        let option = parse_dhcp_option("50=c0a80189").unwrap();
        assert_eq!(option.code, 50);
        assert_eq!(option.data.as_ref(), &[0xc0, 0xa8, 0x01, 0x89]);

        assert!(parse_dhcp_option("50").is_err());
        assert!(parse_dhcp_option("0=01").is_err());
        assert!(parse_dhcp_option("255=").is_err());
        assert!(parse_dhcp_option("256=01").is_err());
        assert!(parse_dhcp_option("50=xyz").is_err());
        assert!(parse_dhcp_option(&format!("43={}", "00".repeat(256))).is_err());
    }

    #[test]
    fn test_parse_flags_accepts_hex_and_decimal() {
        assert_eq!(parse_u16("0x8000"), Ok(0x8000));
        assert_eq!(parse_u16("32768"), Ok(0x8000));
        assert!(parse_u16("0x10000").is_err());
        assert!(parse_u16("+1").is_err());
        assert!(parse_u16("0x+1").is_err());
    }

    #[test]
    fn test_parse_xid_takes_one_prefix() {
        assert_eq!(parse_xid("0xdeadbeef").unwrap(), 0xdead_beef);
        assert_eq!(parse_xid("0X1f").unwrap(), 0x1f);
        assert_eq!(parse_xid("1f").unwrap(), 0x1f);

        for bad in ["0x0x1f", "+ff", "0x+ff", "0x", "", "-1", "1_000", "123456789"] {
            let err = parse_xid(bad).unwrap_err();
            assert!(matches!(err, DhcpUtilError::InvalidArgument(_)), "{bad}");
        }
    }

    #[test]
    fn test_interface_is_required() {
        assert!(Args::try_parse_from(["dhcputil"]).is_err());
    }
}
