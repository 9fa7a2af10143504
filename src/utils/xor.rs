use std::io::{self, Read, Write};
use std::sync::Arc;
use std::time::Instant;

use crate::transport::{Deadline, Duplex};

/// Repeating-key XOR keystream for one direction of one stream.
#[derive(Debug, Clone)]
pub struct Keystream {
    key: Arc<[u8]>,
    position: u64,
}

impl Keystream {
    pub fn new(key: Arc<[u8]>) -> Self {
        Keystream { key, position: 0 }
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn is_identity(&self) -> bool {
        self.key.is_empty()
    }

    /// XORs `buf` in place and moves past it.
    pub fn apply(&mut self, buf: &mut [u8]) {
        if self.is_identity() {
            return;
        }
        let keylen = self.key.len() as u64;
        for byte in buf.iter_mut() {
            *byte ^= self.key[(self.position % keylen) as usize];
            self.position += 1;
        }
    }

    // Masked copy of `buf` starting at the current position, which is left
    // untouched until the bytes are known to be delivered.
    fn mask(&self, buf: &[u8]) -> Vec<u8> {
        let keylen = self.key.len() as u64;
        buf.iter()
            .zip(self.position..)
            .map(|(byte, pos)| byte ^ self.key[(pos % keylen) as usize])
            .collect()
    }

    fn advance(&mut self, n: usize) {
        if !self.is_identity() {
            self.position += n as u64;
        }
    }

    fn write_to<W: Write>(&mut self, inner: &mut W, buf: &[u8]) -> io::Result<usize> {
        if self.is_identity() {
            return inner.write(buf);
        }
        let n = inner.write(&self.mask(buf))?;
        self.advance(n);
        Ok(n)
    }

    fn read_from<R: Read>(&mut self, inner: &mut R, buf: &mut [u8]) -> io::Result<usize> {
        let n = inner.read(buf)?;
        self.apply(&mut buf[..n]);
        Ok(n)
    }
}

pub struct XorReader<R> {
    inner: R,
    stream: Keystream,
}

impl<R> XorReader<R> {
    pub fn new(inner: R, key: Arc<[u8]>) -> Self {
        XorReader { inner, stream: Keystream::new(key) }
    }

    pub fn position(&self) -> u64 {
        self.stream.position()
    }
}

impl<R: Read> Read for XorReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read_from(&mut self.inner, buf)
    }
}

impl<R: Deadline> Deadline for XorReader<R> {
    fn set_read_deadline(&self, at: Option<Instant>) -> io::Result<()> {
        self.inner.set_read_deadline(at)
    }

    fn set_write_deadline(&self, at: Option<Instant>) -> io::Result<()> {
        self.inner.set_write_deadline(at)
    }
}

pub struct XorWriter<W> {
    inner: W,
    stream: Keystream,
}

impl<W> XorWriter<W> {
    pub fn new(inner: W, key: Arc<[u8]>) -> Self {
        XorWriter { inner, stream: Keystream::new(key) }
    }

    pub fn position(&self) -> u64 {
        self.stream.position()
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for XorWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.write_to(&mut self.inner, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Deadline> Deadline for XorWriter<W> {
    fn set_read_deadline(&self, at: Option<Instant>) -> io::Result<()> {
        self.inner.set_read_deadline(at)
    }

    fn set_write_deadline(&self, at: Option<Instant>) -> io::Result<()> {
        self.inner.set_write_deadline(at)
    }
}

/// Duplex XOR wrapper. Both directions share one key but keep their own
/// position, and `split` hands the positions over to the halves.
pub struct XorStream<S> {
    inner: S,
    rx: Keystream,
    tx: Keystream,
}

impl<S> XorStream<S> {
    pub fn new(inner: S, key: Arc<[u8]>) -> Self {
        XorStream {
            inner,
            rx: Keystream::new(key.clone()),
            tx: Keystream::new(key),
        }
    }

    /// (read, write) positions
    pub fn positions(&self) -> (u64, u64) {
        (self.rx.position(), self.tx.position())
    }
}

impl<S: Read> Read for XorStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.rx.read_from(&mut self.inner, buf)
    }
}

impl<S: Write> Write for XorStream<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.tx.write_to(&mut self.inner, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<S: Deadline> Deadline for XorStream<S> {
    fn set_read_deadline(&self, at: Option<Instant>) -> io::Result<()> {
        self.inner.set_read_deadline(at)
    }

    fn set_write_deadline(&self, at: Option<Instant>) -> io::Result<()> {
        self.inner.set_write_deadline(at)
    }
}

impl<S: Duplex> Duplex for XorStream<S> {
    type ReadHalf = XorReader<S::ReadHalf>;
    type WriteHalf = XorWriter<S::WriteHalf>;

    fn split(self) -> io::Result<(Self::ReadHalf, Self::WriteHalf)> {
        let (reader, writer) = self.inner.split()?;
        Ok((
            XorReader { inner: reader, stream: self.rx },
            XorWriter { inner: writer, stream: self.tx },
        ))
    }
}
