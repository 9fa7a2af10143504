use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};

use log::error;

pub mod socks5; // 查找当前目录下的socks5.rs或者socks5目录下的mod.rs

pub struct ProxyServer {
    addr: String,
    ln: TcpListener,
}

impl ProxyServer {
    /// Hands every accepted connection to `handler`, forever. Accept errors
    /// are logged and skipped.
    pub fn listen_conn<F>(&self, mut handler: F)
    where
        F: FnMut(TcpStream),
    {
        for stream in self.ln.incoming() {
            match stream {
                Ok(stream) => handler(stream),
                Err(e) => error!("Accept error: {}", e),
            }
        }
    }

    pub fn get_addr(&self) -> &str {
        &self.addr
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.ln.local_addr()
    }
}

pub fn new_proxy_server(address: &str) -> io::Result<ProxyServer> {
    let listener = TcpListener::bind(address)?;
    let addr_str = format!("tcp://{}", listener.local_addr()?);
    Ok(ProxyServer {
        addr: addr_str,
        ln: listener,
    })
}
