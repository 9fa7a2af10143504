use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("protocol error: bad version {0:#04x}")]
    BadVersion(u8),

    #[error("protocol error: bad reserved byte {0:#04x}")]
    BadReserved(u8),

    #[error("domain name too long: {0} bytes")]
    DomainTooLong(u8),

    #[error("domain name is not valid utf-8")]
    InvalidDomain,

    #[error("config error: {0}")]
    Config(String),

    #[error("listen {addr} failed: {source}")]
    Listen {
        addr: String,
        #[source]
        source: io::Error,
    },
}
