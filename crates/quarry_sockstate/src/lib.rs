//! Inspect the kernel's view of TCP sockets.
//!
//! Used to detect if the client side of a connection has gone away while a
//! long running query is executing. Only Linux is supported; every other
//! platform returns `NotImplemented`.

mod proc_net;

use std::fmt;
use std::net::{SocketAddr, TcpStream};

use quarry_error::Result;

pub use proc_net::parse_proc_net_tcp;

/// TCP connection state as reported by the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SockState {
    Established,
    SynSent,
    SynRecv,
    FinWait1,
    FinWait2,
    TimeWait,
    Close,
    CloseWait,
    LastAck,
    Listen,
    Closing,
}

impl SockState {
    /// Map the kernel's numeric state.
    pub fn from_code(code: u8) -> Option<SockState> {
        Some(match code {
            0x01 => SockState::Established,
            0x02 => SockState::SynSent,
            0x03 => SockState::SynRecv,
            0x04 => SockState::FinWait1,
            0x05 => SockState::FinWait2,
            0x06 => SockState::TimeWait,
            0x07 => SockState::Close,
            0x08 => SockState::CloseWait,
            0x09 => SockState::LastAck,
            0x0A => SockState::Listen,
            0x0B => SockState::Closing,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SockState::Established => "ESTABLISHED",
            SockState::SynSent => "SYN_SENT",
            SockState::SynRecv => "SYN_RECV",
            SockState::FinWait1 => "FIN_WAIT1",
            SockState::FinWait2 => "FIN_WAIT2",
            SockState::TimeWait => "TIME_WAIT",
            SockState::Close => "CLOSE",
            SockState::CloseWait => "CLOSE_WAIT",
            SockState::LastAck => "LAST_ACK",
            SockState::Listen => "LISTEN",
            SockState::Closing => "CLOSING",
        }
    }
}

impl fmt::Display for SockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single row of the kernel's socket table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SockTabEntry {
    pub inode: u64,
    pub local: SocketAddr,
    pub remote: SocketAddr,
    pub state: SockState,
    pub uid: u32,
}

/// List TCP sockets (v4 and v6) for which `accept` returns true.
#[cfg(target_os = "linux")]
pub fn tcp_socks<F>(accept: F) -> Result<Vec<SockTabEntry>>
where
    F: Fn(&SockTabEntry) -> bool,
{
    let mut entries = Vec::new();
    for path in ["/proc/net/tcp", "/proc/net/tcp6"] {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            // Kernel built without IPv6.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && path.ends_with('6') => {
                tracing::debug!(%path, "socket table not present");
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        entries.extend(
            parse_proc_net_tcp(&contents)?
                .into_iter()
                .filter(|entry| accept(entry)),
        );
    }
    Ok(entries)
}

#[cfg(not(target_os = "linux"))]
pub fn tcp_socks<F>(_accept: F) -> Result<Vec<SockTabEntry>>
where
    F: Fn(&SockTabEntry) -> bool,
{
    tracing::warn!(os = std::env::consts::OS, "connection checking not implemented");
    quarry_error::not_implemented!("socket inspection on {}", std::env::consts::OS)
}

/// Find the inode backing a connected stream.
#[cfg(target_os = "linux")]
pub fn conn_inode(stream: &TcpStream) -> Result<u64> {
    let local = stream.local_addr()?;
    let remote = stream.peer_addr()?;

    let entries = tcp_socks(|entry| entry.local == local && entry.remote == remote)?;
    match entries.first() {
        Some(entry) => Ok(entry.inode),
        None => Err(quarry_error::internal!(
            "no socket found for connection {local} -> {remote}"
        )),
    }
}

#[cfg(not(target_os = "linux"))]
pub fn conn_inode(_stream: &TcpStream) -> Result<u64> {
    tracing::warn!(os = std::env::consts::OS, "connection checking not implemented");
    quarry_error::not_implemented!("socket inspection on {}", std::env::consts::OS)
}
