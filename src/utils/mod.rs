pub mod bridge;
pub mod socks5;
pub mod uuid;
pub mod xor;
