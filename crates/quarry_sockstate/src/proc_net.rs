use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use quarry_error::{internal, Result};

use crate::{SockState, SockTabEntry};

/// Parse the contents of `/proc/net/tcp` or `/proc/net/tcp6`.
///
/// The first line is a header. Each following line looks like:
///
/// ```text
///    0: 0100007F:0CEA 00000000:0000 0A 00000000:00000000 00:00000000 00000000  1000        0 12345 ...
/// ```
pub fn parse_proc_net_tcp(contents: &str) -> Result<Vec<SockTabEntry>> {
    contents
        .lines()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(parse_line)
        .collect()
}

fn parse_line(line: &str) -> Result<SockTabEntry> {
    let fields: Vec<_> = line.split_whitespace().collect();
    if fields.len() < 10 {
        return Err(internal!("malformed socket table line: '{line}'"));
    }

    let local = parse_addr(fields[1])?;
    let remote = parse_addr(fields[2])?;
    let state = u8::from_str_radix(fields[3], 16)
        .ok()
        .and_then(SockState::from_code)
        .ok_or_else(|| internal!("invalid socket state '{}'", fields[3]))?;
    let uid = fields[7]
        .parse()
        .map_err(|_| internal!("invalid uid '{}'", fields[7]))?;
    let inode = fields[9]
        .parse()
        .map_err(|_| internal!("invalid inode '{}'", fields[9]))?;

    Ok(SockTabEntry {
        inode,
        local,
        remote,
        state,
        uid,
    })
}

/// Parse `ADDR:PORT` where the address is the kernel's hex encoding of the
/// in-memory representation (32-bit words in host byte order) and the port is
/// big-endian hex.
fn parse_addr(s: &str) -> Result<SocketAddr> {
    let (addr, port) = s
        .split_once(':')
        .ok_or_else(|| internal!("invalid socket address '{s}'"))?;
    let port = u16::from_str_radix(port, 16).map_err(|_| internal!("invalid port '{port}'"))?;

    let ip = match addr.len() {
        8 => IpAddr::V4(Ipv4Addr::from(parse_word(addr)?.to_ne_bytes())),
        32 => {
            let mut octets = [0; 16];
            for (idx, chunk) in octets.chunks_exact_mut(4).enumerate() {
                let word = addr
                    .get(idx * 8..idx * 8 + 8)
                    .ok_or_else(|| internal!("invalid ip address '{addr}'"))?;
                let word = parse_word(word)?;
                chunk.copy_from_slice(&word.to_ne_bytes());
            }
            IpAddr::V6(Ipv6Addr::from(octets))
        }
        _ => return Err(internal!("invalid ip address '{addr}'")),
    };

    Ok(SocketAddr::new(ip, port))
}

fn parse_word(s: &str) -> Result<u32> {
    u32::from_str_radix(s, 16).map_err(|_| internal!("invalid address word '{s}'"))
}
