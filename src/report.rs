//! Human-readable rendering of parsed DHCP messages.

use crate::v4::{
    code,
    header::{BOOTREPLY, BOOTREQUEST},
    format_ipv4,
    options::option_name,
    DhcpMessage, DhcpOption, MessageType,
};
use std::fmt::{self, Write as _};

impl fmt::Display for DhcpMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = &self.header;
        let op = match h.op {
            BOOTREQUEST => "BOOTREQUEST",
            BOOTREPLY => "BOOTREPLY",
            _ => "unknown",
        };
        writeln!(
            f,
            "op: {} ({})  htype: {}  hlen: {}  hops: {}",
            op, h.op, h.htype, h.hlen, h.hops
        )?;
        writeln!(
            f,
            "xid: {:#010x}  secs: {}  flags: {:#06x}{}",
            h.xid,
            h.secs,
            h.flags,
            if h.is_broadcast() { " (broadcast)" } else { "" }
        )?;
        writeln!(f, "ciaddr: {}", format_ipv4(h.ciaddr))?;
        writeln!(f, "yiaddr: {}", format_ipv4(h.yiaddr))?;
        writeln!(f, "siaddr: {}", format_ipv4(h.siaddr))?;
        writeln!(f, "giaddr: {}", format_ipv4(h.giaddr))?;
        match h.client_mac() {
            Some(mac) => writeln!(f, "chaddr: {}", mac)?,
            None => writeln!(f, "chaddr: {}", hex(h.chaddr_bytes()))?,
        }
        let sname = h.sname_str();
        if !sname.is_empty() {
            writeln!(f, "sname: {}", sname)?;
        }
        let file = h.file_str();
        if !file.is_empty() {
            writeln!(f, "file: {}", file)?;
        }

        write!(f, "options:")?;
        if self.options.is_empty() {
            write!(f, " (none)")?;
        }
        for option in &self.options {
            write!(f, "\n  {}", OptionLine(option))?;
        }
        Ok(())
    }
}

/// One option as `code (name): value`.
pub struct OptionLine<'a>(pub &'a DhcpOption);

impl fmt::Display for OptionLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let option = self.0;
        match option_name(option.code) {
            Some(name) => write!(f, "{:>3} ({}): ", option.code, name)?,
            None => write!(f, "{:>3}: ", option.code)?,
        }
        f.write_str(&render_value(option))
    }
}

fn render_value(option: &DhcpOption) -> String {
    let decoded = match option.code {
        code::MESSAGE_TYPE => option
            .as_u8()
            .and_then(|value| MessageType::try_from(value).ok())
            .map(|kind| kind.to_string()),
        code::SUBNET_MASK
        | code::ROUTER
        | code::DOMAIN_NAME_SERVER
        | code::BROADCAST_ADDRESS
        | code::REQUESTED_IP_ADDRESS
        | code::SERVER_IDENTIFIER => option.as_ipv4_list().map(|addrs| {
            addrs
                .iter()
                .map(|addr| format_ipv4(*addr))
                .collect::<Vec<_>>()
                .join(", ")
        }),
        code::ADDRESS_LEASE_TIME | code::RENEWAL_TIME | code::REBINDING_TIME => {
            option.as_u32().map(|secs| format!("{}s", secs))
        }
        code::INTERFACE_MTU | code::MAX_MESSAGE_SIZE => {
            let bytes: Option<[u8; 2]> = option.data[..].try_into().ok();
            bytes.map(|b| u16::from_be_bytes(b).to_string())
        }
        code::HOSTNAME | code::DOMAIN_NAME | code::MESSAGE | code::VENDOR_CLASS_IDENTIFIER => {
            std::str::from_utf8(&option.data)
                .ok()
                .filter(|text| text.chars().all(|c| !c.is_control()))
                .map(|text| format!("\"{}\"", text))
        }
        code::PARAMETER_REQUEST_LIST => Some(
            option
                .data
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(" "),
        ),
        _ => None,
    };
    decoded.unwrap_or_else(|| hex(&option.data))
}

/// Space-separated hex bytes, 32 per line.
pub(crate) fn hex_dump(bytes: &[u8]) -> String {
    bytes
        .chunks(32)
        .map(|row| {
            row.iter()
                .map(|byte| format!("{:02x}", byte))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn hex(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return "(empty)".to_string();
    }
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{:02x}", byte);
    }
    out
}
