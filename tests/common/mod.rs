#![allow(dead_code)]

use std::io::{self, Cursor, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use teleport::transport::{Deadline, Dialer};

/// In-memory client: reads come from `input`, writes land in `output`.
pub struct MockConn {
    input: Cursor<Vec<u8>>,
    pub output: Vec<u8>,
    write_limit: usize,
}

impl MockConn {
    pub fn new(input: &[u8]) -> Self {
        MockConn {
            input: Cursor::new(input.to_vec()),
            output: Vec::new(),
            write_limit: usize::MAX,
        }
    }

    /// Writes that would push `output` past `limit` bytes fail.
    pub fn with_write_limit(mut self, limit: usize) -> Self {
        self.write_limit = limit;
        self
    }

    /// Number of input bytes read so far.
    pub fn consumed(&self) -> u64 {
        self.input.position()
    }
}

impl Read for MockConn {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.input.read(buf)
    }
}

impl Write for MockConn {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.output.len() + buf.len() > self.write_limit {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "client gone"));
        }
        self.output.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Deadline for MockConn {}

/// Dialer that counts attempts and dials whatever `inner` does.
pub struct CountingDialer<D> {
    pub inner: D,
    pub attempts: AtomicUsize,
}

impl<D: Dialer> CountingDialer<D> {
    pub fn new(inner: D) -> Self {
        CountingDialer {
            inner,
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl<D: Dialer> Dialer for CountingDialer<D> {
    fn dial(&self, target: &str) -> io::Result<TcpStream> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.inner.dial(target)
    }
}

pub struct RefusingDialer;

impl Dialer for RefusingDialer {
    fn dial(&self, target: &str) -> io::Result<TcpStream> {
        Err(io::Error::new(io::ErrorKind::ConnectionRefused, format!("refused {}", target)))
    }
}

/// Connected loopback pair: (client side, server side).
pub fn tcp_pair() -> (TcpStream, TcpStream) {
    let ln = TcpListener::bind("127.0.0.1:0").unwrap();
    let client = TcpStream::connect(ln.local_addr().unwrap()).unwrap();
    let (server, _) = ln.accept().unwrap();
    (client, server)
}

/// Echo server on an ephemeral port, one thread per connection.
pub fn spawn_echo_server() -> SocketAddr {
    let ln = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = ln.local_addr().unwrap();
    thread::spawn(move || {
        for conn in ln.incoming() {
            let mut conn = match conn {
                Ok(conn) => conn,
                Err(_) => continue,
            };
            thread::spawn(move || {
                let mut reader = conn.try_clone().unwrap();
                let _ = io::copy(&mut reader, &mut conn);
            });
        }
    });
    addr
}

/// Port nobody listens on.
pub fn closed_port_addr() -> SocketAddr {
    let ln = TcpListener::bind("127.0.0.1:0").unwrap();
    ln.local_addr().unwrap()
}
