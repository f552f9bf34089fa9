//! cadlink CLI
//!
//! Command-line tools for running and poking at the bridge.
//!
//! # Commands
//!
//! - `host` - Run the bridge against an in-memory document
//! - `client` - Listen for a host and send it one request
//! - `tags` - List the registered record tags

mod commands;

use clap::{ArgGroup, Parser, Subcommand};
use commands::client::Request;
use commands::host::HostOptions;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// cadlink bridge tools.
#[derive(Parser)]
#[command(name = "cadlink")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to a client and answer its requests
    Host {
        /// Address of the listening client
        #[arg(short, long)]
        connect: String,

        /// Session key (random if omitted)
        #[arg(short, long)]
        session: Option<String>,

        /// Answer one request and exit
        #[arg(long)]
        once: bool,

        /// Read timeout in seconds
        #[arg(long)]
        read_timeout: Option<u64>,

        /// Do not regenerate dimension layouts before reading bounds
        #[arg(long)]
        no_dimension_regen: bool,

        /// Do not add inserted entities to groups
        #[arg(long)]
        no_group_links: bool,
    },

    /// Listen for a host and send it one request
    #[command(group(ArgGroup::new("request").required(true).args(["ping", "query"])))]
    Client {
        /// Address to listen on
        #[arg(short, long)]
        listen: String,

        /// Send a liveness check
        #[arg(long)]
        ping: bool,

        /// Send the query stored in this JSON file
        #[arg(short, long)]
        query: Option<PathBuf>,
    },

    /// List the registered record tags
    Tags {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Host {
            connect,
            session,
            once,
            read_timeout,
            no_dimension_regen,
            no_group_links,
        } => {
            let options = HostOptions {
                connect,
                session: session.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
                once,
                read_timeout,
                no_dimension_regen,
                no_group_links,
            };
            commands::host::run(&options)?;
        }
        Commands::Client {
            listen,
            ping: _,
            query,
        } => {
            // clap guarantees exactly one of the two
            let request = match &query {
                Some(path) => Request::Query(path),
                None => Request::Ping,
            };
            commands::client::run(&listen, request)?;
        }
        Commands::Tags { format } => {
            commands::tags::run(&format)?;
        }
        Commands::Version => {
            println!("cadlink CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("cadlink protocol v{}", cadlink_protocol::VERSION);
        }
    }

    Ok(())
}
