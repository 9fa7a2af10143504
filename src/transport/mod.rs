mod base;
mod tcp;
mod timed;

pub use base::Deadline;
pub use base::Dialer;
pub use base::Duplex;
pub use tcp::close;
pub use tcp::TcpDialer;
pub use timed::Timed;
