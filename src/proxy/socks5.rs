use std::io::{Read, Write};
use std::net::TcpStream;

use log::{info, warn};

use crate::error::{Error, Result};
use crate::transport::Dialer;
use crate::utils::socks5::{self as wire, AddrInfo};

/// Outcome of the SOCKS5 handshake.
#[derive(Debug, PartialEq, Eq)]
pub enum Handshake {
    /// CONNECT to this target; the reply is still owed.
    Connect(AddrInfo),
    /// The client already got its refusal, nothing left to do.
    Rejected,
}

/// Runs greeting and command phases on `conn`.
///
/// Unsupported methods, commands and address types are answered on the
/// wire and reported as [`Handshake::Rejected`]. Malformed input is an
/// error and gets no reply at all.
pub fn handshake<S: Read + Write>(conn: &mut S) -> Result<Handshake> {
    // 读取 VER 和 NMETHODS
    let [ver, nmethods] = read_array::<_, 2>(conn)?;
    if ver != wire::VERSION {
        return Err(Error::BadVersion(ver));
    }

    // 读取 METHODS 列表
    let methods = read_bytes(conn, nmethods as usize)?;
    if !methods.contains(&wire::METHOD_NO_AUTH) {
        conn.write_all(&[wire::VERSION, wire::METHOD_NOT_ACCEPTABLE])?;
        return Ok(Handshake::Rejected);
    }

    //无需认证
    conn.write_all(&[wire::VERSION, wire::METHOD_NO_AUTH])?;

    // read COMMAND
    let [ver, cmd, rsv, atyp] = read_array::<_, 4>(conn)?;
    if ver != wire::VERSION {
        return Err(Error::BadVersion(ver));
    }
    if rsv != wire::RESERVED {
        return Err(Error::BadReserved(rsv));
    }

    if cmd != wire::CMD_CONNECT {
        conn.write_all(&wire::error_reply(wire::REP_COMMAND_NOT_SUPPORTED))?;
        return Ok(Handshake::Rejected);
    }

    let target = match atyp {
        wire::ATYP_IPV4 => AddrInfo::from_ipv4(&read_array::<_, 6>(conn)?),
        wire::ATYP_DOMAIN => {
            let [len] = read_array::<_, 1>(conn)?;
            if len > wire::MAX_DOMAIN_LEN {
                return Err(Error::DomainTooLong(len));
            }
            AddrInfo::from_domain(&read_bytes(conn, len as usize + 2)?)?
        }
        _ => {
            conn.write_all(&wire::error_reply(wire::REP_ADDRTYPE_NOT_SUPPORTED))?;
            return Ok(Handshake::Rejected);
        }
    };

    Ok(Handshake::Connect(target))
}

/// Full CONNECT exchange: handshake, dial, reply.
///
/// Returns the backend connection once the success reply is written, or
/// `None` when the client was turned away (including a failed dial, which
/// is answered with a general failure).
pub fn negotiate<S, D>(conn: &mut S, dialer: &D, tag: &str) -> Result<Option<TcpStream>>
where
    S: Read + Write,
    D: Dialer + ?Sized,
{
    let target = match handshake(conn)? {
        Handshake::Connect(target) => target.to_string(),
        Handshake::Rejected => return Ok(None),
    };

    info!("{} trying to connect to {}...", tag, target);
    let backconn = match dialer.dial(&target) {
        Ok(backconn) => backconn,
        Err(e) => {
            warn!("{} failed to connect to {}: {}", tag, target, e);
            conn.write_all(&wire::error_reply(wire::REP_GENERAL_FAILURE))?;
            return Ok(None);
        }
    };

    let backaddr = backconn.peer_addr()?;
    conn.write_all(&wire::success_reply(&backaddr))?;
    info!("{} CONNECTED backend {}", tag, backaddr);
    Ok(Some(backconn))
}

fn read_array<R: Read, const N: usize>(conn: &mut R) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    conn.read_exact(&mut buf)?;
    Ok(buf)
}

fn read_bytes<R: Read>(conn: &mut R, count: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; count];
    conn.read_exact(&mut buf)?;
    Ok(buf)
}
