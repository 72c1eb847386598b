//! Log output for the provider process.
//!
//! Everything goes to **stderr**. Stdout carries only the handshake line, and
//! anything else written there breaks the host's parser.
//!
//! `RUST_LOG` overrides the default level, for example to trace each
//! configuration API call and the PATCH operations sent:
//!
//! ```bash
//! RUST_LOG=pingdirectory_provider=debug ./terraform-provider-pingdirectory
//! ```

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Level used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_LOG_LEVEL: &str = "info";

fn install(default_level: &str) -> Result<(), TryInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let output = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);
    Registry::default().with(filter).with(output).try_init()
}

/// Install the global subscriber at [`DEFAULT_LOG_LEVEL`].
///
/// # Panics
///
/// If a global subscriber is already installed.
pub fn init_logging() {
    init_logging_with_default(DEFAULT_LOG_LEVEL);
}

/// Install the global subscriber, falling back to `default_level` when
/// `RUST_LOG` is not usable.
///
/// # Panics
///
/// If a global subscriber is already installed.
pub fn init_logging_with_default(default_level: &str) {
    if let Err(e) = install(default_level) {
        panic!("failed to install the log subscriber: {}", e);
    }
}

/// Like [`init_logging`], but reports `false` instead of panicking when a
/// subscriber is already installed.
pub fn try_init_logging() -> bool {
    install(DEFAULT_LOG_LEVEL).is_ok()
}
