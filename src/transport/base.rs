use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::time::Instant;

/// Deadline support of the innermost socket of a stream.
///
/// Raw sockets arm their timeouts, wrappers forward to the stream they wrap
/// and anything else (in-memory buffers, mocks) keeps the no-op defaults.
/// `None` clears the deadline.
pub trait Deadline {
    fn set_read_deadline(&self, _at: Option<Instant>) -> io::Result<()> {
        Ok(())
    }

    fn set_write_deadline(&self, _at: Option<Instant>) -> io::Result<()> {
        Ok(())
    }
}

impl<T: Deadline + ?Sized> Deadline for &T {
    fn set_read_deadline(&self, at: Option<Instant>) -> io::Result<()> {
        (**self).set_read_deadline(at)
    }

    fn set_write_deadline(&self, at: Option<Instant>) -> io::Result<()> {
        (**self).set_write_deadline(at)
    }
}

impl<T: Deadline + ?Sized> Deadline for &mut T {
    fn set_read_deadline(&self, at: Option<Instant>) -> io::Result<()> {
        (**self).set_read_deadline(at)
    }

    fn set_write_deadline(&self, at: Option<Instant>) -> io::Result<()> {
        (**self).set_write_deadline(at)
    }
}

impl<T: Deadline + ?Sized> Deadline for Box<T> {
    fn set_read_deadline(&self, at: Option<Instant>) -> io::Result<()> {
        (**self).set_read_deadline(at)
    }

    fn set_write_deadline(&self, at: Option<Instant>) -> io::Result<()> {
        (**self).set_write_deadline(at)
    }
}

/// A full-duplex stream that can be taken apart so each direction is
/// driven by its own thread.
pub trait Duplex: Read + Write + Deadline + Send + 'static {
    type ReadHalf: Read + Deadline + Send + 'static;
    type WriteHalf: Write + Deadline + Send + 'static;

    fn split(self) -> io::Result<(Self::ReadHalf, Self::WriteHalf)>;
}

/// Opens outbound connections. Failures are returned, the caller picks
/// the reply.
pub trait Dialer: Send + Sync {
    fn dial(&self, target: &str) -> io::Result<TcpStream>;
}
