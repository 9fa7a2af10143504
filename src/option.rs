use std::fs;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// negotiate the destination with a SOCKS5 handshake
    Socks5,
    /// forward every connection to `backendAddr`
    Relay,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeleportOption {
    pub mode: Mode,
    pub listen_addr: String,
    #[serde(default)]
    pub backend_addr: Option<String>,
    #[serde(default)]
    pub cipher: Option<String>,
    #[serde(default)]
    pub cipher_hex: Option<String>,
    #[serde(default = "loglevel_default")]
    pub log_level: String,
    /// seconds, platform default when absent
    #[serde(default)]
    pub dial_timeout: Option<u64>,
}

impl TeleportOption {
    pub fn new(mode: Mode, listen_addr: &str) -> Self {
        TeleportOption {
            mode,
            listen_addr: listen_addr.to_owned(),
            backend_addr: None,
            cipher: None,
            cipher_hex: None,
            log_level: loglevel_default(),
            dial_timeout: None,
        }
    }

    pub fn from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("read config file {} failed: {}", path, e)))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let opts: TeleportOption =
            serde_json::from_str(content).map_err(|e| Error::Config(format!("invalid config: {}", e)))?;
        opts.validate()?;
        Ok(opts)
    }

    pub fn validate(&self) -> Result<()> {
        if self.listen_addr.trim().is_empty() {
            return Err(Error::Config("listen address is missing".into()));
        }
        if self.mode == Mode::Relay {
            self.relay_backend()?;
        }
        if self.cipher.is_some() && self.cipher_hex.is_some() {
            return Err(Error::Config("cipher and cipherHex are mutually exclusive".into()));
        }
        self.cipher_key()?;
        Ok(())
    }

    pub fn backend(&self) -> Option<&str> {
        self.backend_addr.as_deref().filter(|addr| !addr.trim().is_empty())
    }

    /// Backend of relay mode; missing or blank is a config error.
    pub fn relay_backend(&self) -> Result<&str> {
        self.backend()
            .ok_or_else(|| Error::Config("relay mode requires a backend address".into()))
    }

    /// Raw XOR key bytes. Empty means the stream is left as is.
    pub fn cipher_key(&self) -> Result<Vec<u8>> {
        if let Some(text) = &self.cipher_hex {
            return hex::decode(text.trim()).map_err(|e| Error::Config(format!("invalid cipherHex: {}", e)));
        }
        Ok(self.cipher.as_deref().unwrap_or_default().as_bytes().to_vec())
    }

    pub fn dial_timeout(&self) -> Option<Duration> {
        self.dial_timeout.filter(|secs| *secs > 0).map(Duration::from_secs)
    }

    /// Copy that is safe to print.
    pub fn redacted(&self) -> Self {
        let mut opts = self.clone();
        let hide = |key: &Option<String>| key.as_ref().map(|_| String::from("***"));
        opts.cipher = hide(&self.cipher);
        opts.cipher_hex = hide(&self.cipher_hex);
        opts
    }
}

fn loglevel_default() -> String {
    String::from("info")
}
