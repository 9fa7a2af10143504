use std::io;
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{error, info, warn};

use crate::error::{Error, Result};
use crate::option::{Mode, TeleportOption};
use crate::proxy::{self, socks5, ProxyServer};
use crate::transport::{self, Dialer, Duplex, TcpDialer, Timed};
use crate::utils::bridge;
use crate::utils::uuid;
use crate::utils::xor::XorStream;

pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(60);

enum Route {
    Socks5,
    Relay(String),
}

/// Everything a connection needs, built once from the options.
struct Context {
    route: Route,
    cipher: Arc<[u8]>,
    dialer: Box<dyn Dialer>,
    handshake_timeout: Duration,
}

pub struct Server {
    listener: ProxyServer,
    ctx: Context,
}

impl Server {
    /// Validates `opts` and binds the listen address.
    pub fn bind(opts: TeleportOption) -> Result<Self> {
        opts.validate()?;
        let route = match opts.mode {
            Mode::Socks5 => Route::Socks5,
            Mode::Relay => Route::Relay(opts.relay_backend()?.to_owned()),
        };
        let ctx = Context {
            route,
            cipher: Arc::from(opts.cipher_key()?),
            dialer: Box::new(TcpDialer::new(opts.dial_timeout())),
            handshake_timeout: HANDSHAKE_TIMEOUT,
        };

        let listener = proxy::new_proxy_server(&opts.listen_addr).map_err(|source| Error::Listen {
            addr: opts.listen_addr.clone(),
            source,
        })?;

        Ok(Server { listener, ctx })
    }

    /// Overrides how long a SOCKS5 client gets to finish the handshake.
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.ctx.handshake_timeout = timeout;
        self
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections forever, one supervisor thread each.
    pub fn bootstrap(self) {
        let Server { listener, ctx } = self;
        match &ctx.route {
            Route::Socks5 => info!("Listening on {} (socks5)...", listener.get_addr()),
            Route::Relay(backend) => info!("Listening on {} (relay to {})...", listener.get_addr(), backend),
        }
        if !ctx.cipher.is_empty() {
            info!("xor cipher enabled, key length {}", ctx.cipher.len());
        }

        let ctx = Arc::new(ctx);
        listener.listen_conn(|conn| {
            let ctx = ctx.clone();
            let id = uuid::get_conn_id();
            let spawned = thread::Builder::new()
                .name(format!("conn-{}", id))
                .spawn(move || supervise(conn, &ctx, &id));
            if let Err(e) = spawned {
                error!("spawn connection thread failed: {}", e);
            }
        });
    }
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Frontend,
    Backend,
}

/// Closing handle of one end of the connection pair. The socket is shut
/// down and the disconnect logged exactly once, when the guard drops.
struct Tracked {
    conn: TcpStream,
    side: Side,
    addr: String,
    tag: String,
}

impl Tracked {
    fn new(conn: &TcpStream, side: Side, tag: &str) -> io::Result<Self> {
        let addr = conn
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| String::from("unknown"));
        Ok(Tracked {
            conn: conn.try_clone()?,
            side,
            addr,
            tag: tag.to_owned(),
        })
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        if let Err(e) = transport::close(&self.conn) {
            warn!("{} close {:?} {}: {}", self.tag, self.side, self.addr, e);
        }
        match self.side {
            Side::Frontend => info!("{} DISCONNECTED frontend {}", self.tag, self.addr),
            Side::Backend => info!("{} DISCONNECTED backend {}", self.tag, self.addr),
        }
    }
}

// Error boundary of one connection: whatever happens below ends here as a
// log line and a closed socket pair.
fn supervise(conn: TcpStream, ctx: &Context, id: &str) {
    let tag = format!("[{}]", id);
    let front = match Tracked::new(&conn, Side::Frontend, &tag) {
        Ok(front) => front,
        Err(e) => {
            error!("{} ERROR frontend: {}", tag, e);
            return;
        }
    };
    info!("{} ACCEPTED frontend {}", tag, front.addr);

    let result = match &ctx.route {
        Route::Socks5 => serve_socks5(conn, ctx, &tag),
        Route::Relay(backend) => serve_relay(conn, backend, ctx, &tag),
    };
    if let Err(err) = result {
        error!("{} ERROR frontend {}: {}", tag, front.addr, err);
    }
}

fn serve_socks5(conn: TcpStream, ctx: &Context, tag: &str) -> Result<()> {
    let deadline = Instant::now() + ctx.handshake_timeout;
    if ctx.cipher.is_empty() {
        socks5_session(conn, deadline, ctx, tag)
    } else {
        socks5_session(XorStream::new(conn, ctx.cipher.clone()), deadline, ctx, tag)
    }
}

fn socks5_session<F: Duplex>(mut front: F, deadline: Instant, ctx: &Context, tag: &str) -> Result<()> {
    let negotiated = socks5::negotiate(&mut Timed::new(&mut front, deadline), ctx.dialer.as_ref(), tag)?;
    let backconn = match negotiated {
        Some(backconn) => backconn,
        None => return Ok(()),
    };
    let _back = Tracked::new(&backconn, Side::Backend, tag)?;

    bridge::pipe(front, backconn, tag)?;
    Ok(())
}

fn serve_relay(front: TcpStream, backend: &str, ctx: &Context, tag: &str) -> Result<()> {
    info!("{} trying to connect to {}...", tag, backend);
    let backconn = match ctx.dialer.dial(backend) {
        Ok(backconn) => backconn,
        Err(e) => {
            warn!("{} failed to connect to {}: {}", tag, backend, e);
            return Ok(());
        }
    };
    let back = Tracked::new(&backconn, Side::Backend, tag)?;
    info!("{} CONNECTED backend {}", tag, back.addr);

    if ctx.cipher.is_empty() {
        bridge::pipe(front, backconn, tag)?;
    } else {
        bridge::pipe(front, XorStream::new(backconn, ctx.cipher.clone()), tag)?;
    }
    Ok(())
}
