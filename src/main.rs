use std::process;

use clap::{CommandFactory, Parser, Subcommand};
use log::{debug, error};

use teleport::option::{Mode, TeleportOption};
use teleport::server::Server;
use teleport::Result;

/// teleport is a tcp relay for bypass firewall
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// config file of teleport start
    #[arg(short, long)]
    pub config: Option<String>,

    /// log filter, e.g. info, debug, teleport=trace
    #[arg(short, long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// SOCKS5 proxy server
    Socks5 {
        /// listen address, e.g. 0.0.0.0:1080
        listen: String,
        #[command(flatten)]
        cipher: CipherArgs,
    },
    /// forward every connection to one backend
    Relay {
        /// listen address, e.g. 127.0.0.1:1080
        listen: String,
        /// backend address, e.g. foo.com:80
        backend: String,
        #[command(flatten)]
        cipher: CipherArgs,
    },
}

#[derive(clap::Args, Debug)]
pub struct CipherArgs {
    /// xor cipher key
    #[arg(long, conflicts_with = "cipher_hex")]
    pub cipher: Option<String>,
    /// xor cipher key, hex encoded
    #[arg(long)]
    pub cipher_hex: Option<String>,
}

fn load_options(args: Args) -> Result<Option<TeleportOption>> {
    let mut opts = match (args.config, args.command) {
        (Some(path), _) => TeleportOption::from_file(&path)?,
        (None, Some(Command::Socks5 { listen, cipher })) => {
            let mut opts = TeleportOption::new(Mode::Socks5, &listen);
            opts.cipher = cipher.cipher;
            opts.cipher_hex = cipher.cipher_hex;
            opts
        }
        (None, Some(Command::Relay { listen, backend, cipher })) => {
            let mut opts = TeleportOption::new(Mode::Relay, &listen);
            opts.backend_addr = Some(backend);
            opts.cipher = cipher.cipher;
            opts.cipher_hex = cipher.cipher_hex;
            opts
        }
        (None, None) => return Ok(None),
    };
    if let Some(level) = args.log_level {
        opts.log_level = level;
    }
    opts.validate()?;
    Ok(Some(opts))
}

fn main() {
    let args = Args::parse();
    let opts = match load_options(args) {
        Ok(Some(opts)) => opts,
        Ok(None) => {
            let _ = Args::command().print_help();
            return;
        }
        Err(e) => {
            eprintln!("{}", e);
            process::exit(2);
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&opts.log_level)).init();
    if let Ok(jsonstr) = serde_json::to_string_pretty(&opts.redacted()) {
        debug!("teleport options:\n{}", jsonstr);
    }

    let server = match Server::bind(opts) {
        Ok(server) => server,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };
    server.bootstrap();
}
