use std::fmt::{self, Display, Formatter};
use std::net::{Ipv4Addr, SocketAddr};

use crate::error::{Error, Result};

pub const VERSION: u8 = 0x05;
pub const RESERVED: u8 = 0x00;

pub const METHOD_NO_AUTH: u8 = 0x00;
pub const METHOD_NOT_ACCEPTABLE: u8 = 0xff;

pub const CMD_CONNECT: u8 = 0x01;

pub const ATYP_IPV4: u8 = 0x01;
pub const ATYP_DOMAIN: u8 = 0x03;

pub const REP_SUCCEEDED: u8 = 0x00;
pub const REP_GENERAL_FAILURE: u8 = 0x05;
pub const REP_COMMAND_NOT_SUPPORTED: u8 = 0x07;
pub const REP_ADDRTYPE_NOT_SUPPORTED: u8 = 0x08;

pub const MAX_DOMAIN_LEN: u8 = 253;

/// Destination of a CONNECT request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddrInfo {
    pub host: String,
    pub port: u16,
}

impl AddrInfo {
    /// 4 address bytes followed by the big-endian port.
    pub fn from_ipv4(buf: &[u8; 6]) -> Self {
        let host = Ipv4Addr::new(buf[0], buf[1], buf[2], buf[3]).to_string();
        let port = u16::from_be_bytes([buf[4], buf[5]]);
        AddrInfo { host, port }
    }

    /// Name bytes followed by the big-endian port.
    pub fn from_domain(buf: &[u8]) -> Result<Self> {
        if buf.len() < 2 {
            return Err(Error::InvalidDomain);
        }
        let (name, port) = buf.split_at(buf.len() - 2);
        let host = std::str::from_utf8(name).map_err(|_| Error::InvalidDomain)?.to_owned();
        let port = u16::from_be_bytes([port[0], port[1]]);
        Ok(AddrInfo { host, port })
    }
}

impl Display for AddrInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

// e.g.: 74.125.31.104:80 -> [74 125 31 104 0 80]
// IPv6 peers keep the port but report an unspecified address.
pub fn pack_net_addr(addr: &SocketAddr) -> [u8; 6] {
    let ip = match addr {
        SocketAddr::V4(v4) => *v4.ip(),
        SocketAddr::V6(v6) => v6.ip().to_ipv4_mapped().unwrap_or(Ipv4Addr::UNSPECIFIED),
    };
    let mut buf = [0u8; 6];
    buf[..4].copy_from_slice(&ip.octets());
    buf[4..].copy_from_slice(&addr.port().to_be_bytes());
    buf
}

pub fn error_reply(reason: u8) -> [u8; 10] {
    [VERSION, reason, RESERVED, ATYP_IPV4, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]
}

pub fn success_reply(bound: &SocketAddr) -> [u8; 10] {
    let mut buf = error_reply(REP_SUCCEEDED);
    buf[4..].copy_from_slice(&pack_net_addr(bound));
    buf
}
