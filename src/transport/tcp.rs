use std::io::{self, Error, ErrorKind};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use super::base::{Deadline, Dialer, Duplex};

impl Deadline for TcpStream {
    fn set_read_deadline(&self, at: Option<Instant>) -> io::Result<()> {
        self.set_read_timeout(remaining(at)?)
    }

    fn set_write_deadline(&self, at: Option<Instant>) -> io::Result<()> {
        self.set_write_timeout(remaining(at)?)
    }
}

impl Duplex for TcpStream {
    type ReadHalf = TcpStream;
    type WriteHalf = TcpStream;

    fn split(self) -> io::Result<(TcpStream, TcpStream)> {
        let writer = self.try_clone()?;
        Ok((self, writer))
    }
}

// std sockets only know per-call timeouts; a deadline that already passed
// must fail here since a zero timeout is rejected by set_*_timeout.
fn remaining(at: Option<Instant>) -> io::Result<Option<Duration>> {
    match at {
        None => Ok(None),
        Some(at) => {
            let left = at.saturating_duration_since(Instant::now());
            if left.is_zero() {
                Err(Error::new(ErrorKind::TimedOut, "deadline exceeded"))
            } else {
                Ok(Some(left))
            }
        }
    }
}

/// Shuts the socket down in both directions. Sockets that are already
/// closed or reset are fine.
pub fn close(conn: &TcpStream) -> io::Result<()> {
    match conn.shutdown(Shutdown::Both) {
        Err(e) if e.kind() != ErrorKind::NotConnected => Err(e),
        _ => Ok(()),
    }
}

#[derive(Debug, Default, Clone)]
pub struct TcpDialer {
    timeout: Option<Duration>,
}

impl TcpDialer {
    pub fn new(timeout: Option<Duration>) -> Self {
        TcpDialer { timeout }
    }
}

impl Dialer for TcpDialer {
    fn dial(&self, target: &str) -> io::Result<TcpStream> {
        let timeout = match self.timeout {
            Some(timeout) => timeout,
            None => return TcpStream::connect(target),
        };

        let mut last_err = None;
        for socket_addr in target.to_socket_addrs()? {
            match TcpStream::connect_timeout(&socket_addr, timeout) {
                Ok(conn) => return Ok(conn),
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| Error::new(ErrorKind::InvalidInput, format!("could not resolve {}", target))))
    }
}
