//! DHCP client driver
//!
//! One run of the tool:
//! - resolve the interface identity and open the bound socket
//! - build and send a single request
//! - collect replies until the reply limit or the timeout

use crate::{
    config::ProbeConfig,
    error::DhcpUtilError,
    network::{self, InterfaceIdentity, Transport},
    report,
    v4::{build_request, DhcpMessage, RequestParams},
};
use bytes::Bytes;
use std::net::SocketAddr;
use tokio::time::Instant;

/// A parsed reply and where it came from.
#[derive(Debug, Clone)]
pub struct Reply {
    pub from: SocketAddr,
    pub message: DhcpMessage,
}

#[derive(Debug)]
pub struct DhcpClient {
    config: ProbeConfig,
    identity: InterfaceIdentity,
    transport: Transport,
}

impl DhcpClient {
    /// Looks up the interface and opens a socket bound to it.
    pub async fn new(config: ProbeConfig) -> Result<Self, DhcpUtilError> {
        let identity = InterfaceIdentity::discover(&config.interface).await?;

        let socket = network::new_tokio_socket_bound_to_device(
            &config.interface,
            config.bind_addr,
            config.ttl,
        )?;
        tracing::info!("Bound to {} as {}", config.interface, config.bind_addr);

        Ok(Self::with_transport(config, identity, Transport::new(socket)))
    }

    /// Uses an already-open transport and a known identity.
    pub fn with_transport(
        config: ProbeConfig,
        identity: InterfaceIdentity,
        transport: Transport,
    ) -> Self {
        Self {
            config,
            identity,
            transport,
        }
    }

    pub fn identity(&self) -> &InterfaceIdentity {
        &self.identity
    }

    /// Request parameters from the configuration and the interface identity.
    pub fn request_params(&self, xid: u32) -> RequestParams {
        let config = &self.config;
        let mut params = RequestParams::new(config.message_type, xid, self.identity.mac);
        params.secs = config.secs;
        params.flags = config.flags;
        params.ciaddr = config.client_ip.unwrap_or(self.identity.ipv4);
        params.yiaddr = config.your_ip;
        params.giaddr = config.gateway_ip;
        params.server_id = config.server_id;
        params.sname = config.server_name.clone();
        params.file = config.boot_file.clone();
        params.extra_options = config.options.clone();
        params
    }

    /// Builds the request for this run, picking a random xid when none is set.
    pub fn build_request(&self) -> Result<(u32, Bytes), DhcpUtilError> {
        let xid = self.config.xid.unwrap_or_else(rand::random);
        let packet = build_request(&self.request_params(xid))?;
        Ok((xid, packet))
    }

    /// Sends the request once and returns the replies that match its xid.
    ///
    /// With a zero timeout nothing is received. Otherwise waiting stops at the
    /// reply limit or when the timeout expires; expiry with no reply at all is
    /// [`DhcpUtilError::ReceiveTimeout`].
    pub async fn run(&mut self) -> Result<Vec<Reply>, DhcpUtilError> {
        let (xid, packet) = self.build_request()?;
        if let Some(dst_ether) = self.config.dst_ether {
            tracing::warn!(
                "Destination MAC {} ignored: the kernel resolves the link-layer destination",
                dst_ether
            );
        }

        tracing::info!(
            "Sending {} (xid {:#010x}, {} bytes) to {}",
            self.config.message_type,
            xid,
            packet.len(),
            self.config.destination
        );
        tracing::debug!("Packet bytes:\n{}", report::hex_dump(&packet));
        let written = self.transport.send(self.config.destination, &packet).await?;
        tracing::info!("Wrote {} bytes", written);

        if !self.config.waits_for_reply() {
            return Ok(Vec::new());
        }
        self.collect_replies(xid).await
    }

    async fn collect_replies(&mut self, xid: u32) -> Result<Vec<Reply>, DhcpUtilError> {
        let timeout = self.config.timeout;
        let deadline = Instant::now() + timeout;
        let limit = self.config.reply_count;
        let mut replies = Vec::new();

        while limit == 0 || replies.len() < limit {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let (datagram, from) = match self.transport.receive(remaining).await {
                Ok(received) => received,
                Err(DhcpUtilError::ReceiveTimeout(_)) if !replies.is_empty() => break,
                Err(DhcpUtilError::ReceiveTimeout(_)) => {
                    return Err(DhcpUtilError::ReceiveTimeout(timeout))
                }
                Err(e) => return Err(e),
            };

            let message = match DhcpMessage::parse(&datagram) {
                Ok(message) => message,
                Err(e) => {
                    tracing::warn!("Ignoring malformed reply from {}: {}", from, e);
                    continue;
                }
            };

            if message.xid() != xid {
                tracing::debug!(
                    "XID mismatch ({:#010x} != {:#010x}), ignoring packet from {}",
                    message.xid(),
                    xid,
                    from
                );
                continue;
            }

            tracing::info!(
                "Received {} from {}",
                message
                    .message_type()
                    .map(|kind| kind.to_string())
                    .unwrap_or_else(|| "reply without message type".to_string()),
                from
            );
            replies.push(Reply { from, message });
        }

        Ok(replies)
    }
}
