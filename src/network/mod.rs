//! Interface lookup and the UDP transport used to exchange DHCP datagrams.

use crate::{error::DhcpUtilError, v4::MacAddr};
use bytes::{Bytes, BytesMut};
use std::{
    io,
    net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket as StdUdpSocket},
    path::Path,
    time::Duration,
};
use thiserror::Error;
use tokio::{net::UdpSocket as TokioUdpSocket, time};

/// First receive buffer size; grown when a datagram fills it.
pub const INITIAL_RECEIVE_CAPACITY: usize = 1500;

const SYSFS_NET_DIR: &str = "/sys/class/net";

/// Largest UDP payload over IPv4.
const MAX_DATAGRAM_LEN: usize = 65_507;

/// Defines all possible errors for socket and interface operations.
#[derive(Error, Debug)]
pub enum SocketError {
    #[error("Failed to create a new socket")]
    CreateSocket(#[source] io::Error),

    #[error("Failed to enable broadcast on socket")]
    SetBroadcast(#[source] io::Error),

    #[error("Failed to set SO_BINDTODEVICE on interface '{interface}'")]
    BindToDevice {
        interface: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to bind socket to {addr}")]
    BindSocket {
        addr: SocketAddrV4,
        #[source]
        source: io::Error,
    },

    #[error("Failed to set SO_REUSEADDR on socket")]
    SetReuseAddress(#[source] io::Error),

    #[error("Failed to set TTL {ttl} on socket")]
    SetTtl {
        ttl: u32,
        #[source]
        source: io::Error,
    },

    #[error("Failed to set socket to non-blocking mode")]
    SetNonBlocking(#[source] io::Error),

    #[error("Failed to convert socket to TokioUdpSocket")]
    ConvertToTokio(#[source] io::Error),

    #[error("Failed to read hardware address of '{interface}'")]
    HardwareAddress {
        interface: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to list interface addresses")]
    InterfaceAddresses(#[source] io::Error),

    #[allow(dead_code)]
    #[error("Binding to a specific device is not implemented on this platform")]
    NotImplemented,
}

/// Creates a new `tokio::net::UdpSocket` bound to a specific network device.
///
/// The socket can send broadcasts, reuses the address, and is bound to
/// `bind_addr` after `SO_BINDTODEVICE` has tied it to `interface`.
///
/// # Arguments
/// * `interface` - The name of the network interface (e.g., "eth0").
/// * `bind_addr` - Local address and port, usually `0.0.0.0:68`.
/// * `ttl` - IP time-to-live for outgoing datagrams, kernel default if `None`.
#[cfg(target_os = "linux")]
pub fn new_tokio_socket_bound_to_device(
    interface: &str,
    bind_addr: SocketAddrV4,
    ttl: Option<u32>,
) -> Result<TokioUdpSocket, SocketError> {
    use socket2::{Domain, Socket, Type};
    use std::os::fd::AsRawFd;

    let socket2 =
        Socket::new(Domain::IPV4, Type::DGRAM, None).map_err(SocketError::CreateSocket)?;

    socket2
        .set_broadcast(true)
        .map_err(SocketError::SetBroadcast)?;

    socket2
        .set_reuse_address(true)
        .map_err(SocketError::SetReuseAddress)?;

    if let Some(ttl) = ttl {
        socket2
            .set_ttl(ttl)
            .map_err(|source| SocketError::SetTtl { ttl, source })?;
    }

    // SAFETY: the fd is owned by `socket2` and the option value points at
    // `interface.len()` readable bytes.
    let ret = unsafe {
        libc::setsockopt(
            socket2.as_raw_fd(),
            libc::SOL_SOCKET,
            libc::SO_BINDTODEVICE,
            interface.as_ptr() as *const libc::c_void,
            interface.len() as libc::socklen_t,
        )
    };
    if ret < 0 {
        return Err(SocketError::BindToDevice {
            interface: interface.to_string(),
            source: io::Error::last_os_error(),
        });
    }

    socket2
        .bind(&SocketAddr::V4(bind_addr).into())
        .map_err(|source| SocketError::BindSocket {
            addr: bind_addr,
            source,
        })?;

    into_tokio(socket2.into())
}

/// Fallback for non-Linux systems where `SO_BINDTODEVICE` is not available.
#[cfg(not(target_os = "linux"))]
pub fn new_tokio_socket_bound_to_device(
    _interface: &str,
    _bind_addr: SocketAddrV4,
    _ttl: Option<u32>,
) -> Result<TokioUdpSocket, SocketError> {
    Err(SocketError::NotImplemented)
}

fn into_tokio(std_socket: StdUdpSocket) -> Result<TokioUdpSocket, SocketError> {
    std_socket
        .set_nonblocking(true)
        .map_err(SocketError::SetNonBlocking)?;
    TokioUdpSocket::from_std(std_socket).map_err(SocketError::ConvertToTokio)
}

/// Hardware and IPv4 address of the interface a request is sent from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceIdentity {
    pub name: String,
    pub mac: MacAddr,
    /// `0.0.0.0` when the interface has no IPv4 address yet.
    pub ipv4: Ipv4Addr,
}

impl InterfaceIdentity {
    /// Looks up the MAC (from sysfs) and the first IPv4 address of `interface`.
    pub async fn discover(interface: &str) -> Result<Self, DhcpUtilError> {
        Self::discover_in(SYSFS_NET_DIR, interface).await
    }

    /// Like [`InterfaceIdentity::discover`], reading `<net_dir>/<interface>/address`.
    ///
    /// A missing address file is [`DhcpUtilError::InterfaceInvalid`]; any other
    /// failure keeps its source.
    pub async fn discover_in(
        net_dir: impl AsRef<Path>,
        interface: &str,
    ) -> Result<Self, DhcpUtilError> {
        let mac_path = net_dir.as_ref().join(interface).join("address");
        let mac = read_mac_address(&mac_path).await.map_err(|e| match e {
            DhcpUtilError::Io(source) if source.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("{} not readable: {}", mac_path.display(), source);
                DhcpUtilError::InterfaceInvalid(interface.to_string())
            }
            DhcpUtilError::Io(source) => DhcpUtilError::Socket(SocketError::HardwareAddress {
                interface: interface.to_string(),
                source,
            }),
            other => other,
        })?;

        let ipv4 = match interface_ipv4(interface)? {
            Some(addr) => addr,
            None => {
                tracing::warn!("No IPv4 address on {}, using 0.0.0.0", interface);
                Ipv4Addr::UNSPECIFIED
            }
        };

        tracing::debug!("Interface {}: mac={} ipv4={}", interface, mac, ipv4);
        Ok(Self {
            name: interface.to_string(),
            mac,
            ipv4,
        })
    }
}

/// Reads a colon-hex MAC address from a sysfs-style file.
pub async fn read_mac_address(path: impl AsRef<Path>) -> Result<MacAddr, DhcpUtilError> {
    let contents = tokio::fs::read_to_string(path.as_ref()).await?;
    contents
        .trim()
        .parse::<MacAddr>()
        .map_err(|_| DhcpUtilError::MacParse(contents.trim().to_string()))
}

/// First IPv4 address assigned to `interface`, via `getifaddrs(3)`.
#[cfg(unix)]
pub fn interface_ipv4(interface: &str) -> Result<Option<Ipv4Addr>, SocketError> {
    use std::ffi::CStr;

    let mut addrs: *mut libc::ifaddrs = std::ptr::null_mut();
    // SAFETY: getifaddrs fills `addrs` with a list we free below.
    if unsafe { libc::getifaddrs(&mut addrs) } != 0 {
        return Err(SocketError::InterfaceAddresses(io::Error::last_os_error()));
    }

    let mut found = None;
    let mut cursor = addrs;
    while !cursor.is_null() {
        // SAFETY: `cursor` is a node of the list returned by getifaddrs.
        let entry = unsafe { &*cursor };
        cursor = entry.ifa_next;

        if entry.ifa_addr.is_null() || entry.ifa_name.is_null() {
            continue;
        }
        // SAFETY: non-null `ifa_name` is a NUL-terminated string and
        // `ifa_addr` points at a sockaddr of the family it declares.
        let (name, family) = unsafe {
            (
                CStr::from_ptr(entry.ifa_name),
                (*entry.ifa_addr).sa_family as libc::c_int,
            )
        };
        if family != libc::AF_INET || name.to_bytes() != interface.as_bytes() {
            continue;
        }
        // SAFETY: AF_INET entries carry a sockaddr_in.
        let sin = unsafe { &*(entry.ifa_addr as *const libc::sockaddr_in) };
        found = Some(Ipv4Addr::from(u32::from_be(sin.sin_addr.s_addr)));
        break;
    }

    // SAFETY: `addrs` came from getifaddrs and is freed exactly once.
    unsafe { libc::freeifaddrs(addrs) };
    Ok(found)
}

#[cfg(not(unix))]
pub fn interface_ipv4(_interface: &str) -> Result<Option<Ipv4Addr>, SocketError> {
    Err(SocketError::NotImplemented)
}

/// A UDP socket that sends one datagram at a time and receives with growth.
#[derive(Debug)]
pub struct Transport {
    socket: TokioUdpSocket,
    receive_capacity: usize,
}

impl Transport {
    pub fn new(socket: TokioUdpSocket) -> Self {
        Self {
            socket,
            receive_capacity: INITIAL_RECEIVE_CAPACITY,
        }
    }

    /// Sets the size of the first receive buffer.
    pub fn with_receive_capacity(mut self, capacity: usize) -> Self {
        self.receive_capacity = capacity.clamp(1, MAX_DATAGRAM_LEN);
        self
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub async fn send(&self, dest: SocketAddrV4, bytes: &[u8]) -> Result<usize, DhcpUtilError> {
        let written = self.socket.send_to(bytes, SocketAddr::V4(dest)).await?;
        tracing::debug!("Sent {} bytes to {}", written, dest);
        Ok(written)
    }

    /// Waits up to `timeout` for one datagram.
    pub async fn receive(&self, timeout: Duration) -> Result<(Bytes, SocketAddr), DhcpUtilError> {
        tracing::debug!("Waiting for response with timeout: {:?}", timeout);
        match time::timeout(timeout, self.receive_datagram()).await {
            Ok(Ok((datagram, addr))) => {
                tracing::debug!("Received {} bytes from {}", datagram.len(), addr);
                Ok((datagram, addr))
            }
            Ok(Err(e)) => {
                tracing::error!("Socket receive error: {}", e);
                Err(DhcpUtilError::Io(e))
            }
            Err(_) => Err(DhcpUtilError::ReceiveTimeout(timeout)),
        }
    }

    /// Peeks the pending datagram, doubling the buffer while a peek fills it,
    /// then reads it for real.
    async fn receive_datagram(&self) -> io::Result<(Bytes, SocketAddr)> {
        let mut buf = BytesMut::zeroed(self.receive_capacity);
        loop {
            let (peeked, _) = self.socket.peek_from(&mut buf).await?;
            if peeked < buf.len() || buf.len() >= MAX_DATAGRAM_LEN {
                break;
            }
            let grown = (buf.len() * 2).min(MAX_DATAGRAM_LEN);
            tracing::trace!("Datagram filled {} byte buffer, growing to {}", buf.len(), grown);
            buf.resize(grown, 0);
        }
        let (len, addr) = self.socket.recv_from(&mut buf).await?;
        buf.truncate(len);
        Ok((buf.freeze(), addr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loopback_address_is_loopback() {
        if let Some(addr) = interface_ipv4("lo").unwrap() {
            assert!(addr.is_loopback());
        }
    }

    #[test]
    fn test_unknown_interface_has_no_ipv4() {
        assert_eq!(interface_ipv4("no-such-if0").unwrap(), None);
    }

    #[tokio::test]
    async fn test_discover_reads_address_file() {
        let net_dir = tempfile::tempdir().unwrap();
        let if_dir = net_dir.path().join("no-such-if0");
        std::fs::create_dir(&if_dir).unwrap();
        std::fs::write(if_dir.join("address"), "02:00:00:00:00:01\n").unwrap();

        let identity = InterfaceIdentity::discover_in(net_dir.path(), "no-such-if0")
            .await
            .unwrap();
        assert_eq!(identity.mac, MacAddr([2, 0, 0, 0, 0, 1]));
        assert_eq!(identity.ipv4, Ipv4Addr::UNSPECIFIED);
    }

    #[tokio::test]
    async fn test_discover_missing_interface() {
        let net_dir = tempfile::tempdir().unwrap();
        let err = InterfaceIdentity::discover_in(net_dir.path(), "no-such-if0")
            .await
            .unwrap_err();
        assert!(matches!(err, DhcpUtilError::InterfaceInvalid(name) if name == "no-such-if0"));
    }

    #[tokio::test]
    async fn test_discover_keeps_io_error_source() {
        use std::error::Error as _;

        // `address` is a directory, so the read fails with something other than NotFound.
        let net_dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(net_dir.path().join("eth9").join("address")).unwrap();

        let err = InterfaceIdentity::discover_in(net_dir.path(), "eth9")
            .await
            .unwrap_err();
        let DhcpUtilError::Socket(SocketError::HardwareAddress { interface, source }) = &err else {
            panic!("unexpected error: {err:?}");
        };
        assert_eq!(interface, "eth9");
        assert_ne!(source.kind(), io::ErrorKind::NotFound);

        let socket_error = err.source().unwrap();
        assert!(socket_error.source().unwrap().is::<io::Error>());
    }

    #[tokio::test]
    async fn test_discover_reports_bad_mac_text() {
        let net_dir = tempfile::tempdir().unwrap();
        let if_dir = net_dir.path().join("eth9");
        std::fs::create_dir(&if_dir).unwrap();
        std::fs::write(if_dir.join("address"), "garbage\n").unwrap();

        let err = InterfaceIdentity::discover_in(net_dir.path(), "eth9")
            .await
            .unwrap_err();
        assert!(matches!(err, DhcpUtilError::MacParse(text) if text == "garbage"));
    }

    #[tokio::test]
    async fn test_receive_capacity_is_clamped() {
        let std_socket = StdUdpSocket::bind("127.0.0.1:0").unwrap();
        let transport = Transport::new(into_tokio(std_socket).unwrap()).with_receive_capacity(0);
        assert_eq!(transport.receive_capacity, 1);

        let transport = transport.with_receive_capacity(usize::MAX);
        assert_eq!(transport.receive_capacity, MAX_DATAGRAM_LEN);
    }
}
