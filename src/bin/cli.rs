//! ramptxn CLI Client
//!
//! Command-line interface for running transactions against ramptxn servers.

use clap::{Parser, Subcommand};
use ramptxn::protocol::{Reply, Request};
use ramptxn::{Client, ClientConfig, ReadTransaction, Transport, WriteTransaction};
use tracing_subscriber::{fmt, EnvFilter};

/// ramptxn CLI
#[derive(Parser, Debug)]
#[command(name = "ramptxn-cli")]
#[command(about = "CLI for read-atomic transactions")]
struct Args {
    /// Server address (repeat for every server, in the same order on every client)
    #[arg(short, long, default_value = "127.0.0.1:7400")]
    server: Vec<String>,

    /// Client id prefixed onto transaction ids (unique per client)
    #[arg(short, long, default_value = "1")]
    client_id: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write keys atomically
    Write {
        /// key=value pairs
        #[arg(required = true)]
        pairs: Vec<String>,
    },

    /// Read keys atomically
    Read {
        /// Keys to read
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Ping the first server
    Ping,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> ramptxn::Result<()> {
    let config = ClientConfig::builder()
        .client_id(args.client_id)
        .server_addrs(args.server)
        .build();
    let client = Client::connect(&config)?;

    match args.command {
        Commands::Write { pairs } => {
            let mut txn = WriteTransaction::new();
            for pair in pairs {
                let (key, value) = pair.split_once('=').ok_or_else(|| {
                    ramptxn::TxnError::Config(format!("expected key=value, got {:?}", pair))
                })?;
                txn = txn.put(key, value);
            }
            let tid = client.write_only_txn(&txn)?;
            println!("OK {}", tid);
        }
        Commands::Read { keys } => {
            let txn: ReadTransaction = keys.into_iter().collect();
            for (key, value) in client.read_only_txn(&txn)? {
                match value {
                    Some(v) => println!(
                        "{} = {}",
                        String::from_utf8_lossy(&key),
                        String::from_utf8_lossy(&v)
                    ),
                    None => println!("{} = (nil)", String::from_utf8_lossy(&key)),
                }
            }
        }
        Commands::Ping => match client.transport().call(Request::Ping)? {
            Reply::Pong => println!("PONG"),
            other => println!("unexpected reply: {:?}", other),
        },
    }

    Ok(())
}
