use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use pingdirectory_provider::logging::DEFAULT_LOG_LEVEL;
use pingdirectory_provider::server::DEFAULT_SHUTDOWN_TIMEOUT;
use pingdirectory_provider::{
    init_logging_with_default, serve_on_with_options, serve_with_options, PingDirectoryProvider,
    ServeOptions,
};

/// Provider plugin for the PingDirectory configuration API
#[derive(Parser, Debug)]
#[command(name = "terraform-provider-pingdirectory", version, about, long_about = None)]
struct Args {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long)]
    debug: bool,

    /// Listen on this address instead of a random local port
    #[arg(long)]
    address: Option<SocketAddr>,

    /// Seconds in-flight requests get to finish after SIGTERM/SIGINT
    #[arg(long, default_value_t = DEFAULT_SHUTDOWN_TIMEOUT.as_secs())]
    shutdown_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    init_logging_with_default(if args.debug { "debug" } else { DEFAULT_LOG_LEVEL });
    tracing::debug!(?args, "Starting provider");

    let provider = PingDirectoryProvider::new();
    let options = ServeOptions::new().with_shutdown_timeout(Duration::from_secs(args.shutdown_timeout));
    match args.address {
        Some(addr) => serve_on_with_options(provider, addr, options).await,
        None => serve_with_options(provider, options).await,
    }
}
