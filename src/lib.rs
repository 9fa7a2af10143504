// 目录模块
pub mod proxy;
pub mod transport;
pub mod utils;
// 文件模块
pub mod error;
pub mod option;
pub mod server;

pub use error::{Error, Result};
