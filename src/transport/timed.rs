use std::io::{self, Read, Write};
use std::time::Instant;

use super::base::Deadline;

/// Holds every read and write on `inner` to one absolute deadline by
/// re-arming the remaining time before each call.
pub struct Timed<S> {
    inner: S,
    deadline: Instant,
}

impl<S: Deadline> Timed<S> {
    pub fn new(inner: S, deadline: Instant) -> Self {
        Timed { inner, deadline }
    }
}

impl<S: Read + Deadline> Read for Timed<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.set_read_deadline(Some(self.deadline))?;
        self.inner.read(buf)
    }
}

impl<S: Write + Deadline> Write for Timed<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.set_write_deadline(Some(self.deadline))?;
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
